//! 后端统一响应信封 `{success, data, message, statusCode}`

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::ApiError;

/// 响应信封
///
/// `data` 先保留为原始 JSON，成功时再按调用方需要的类型解析，
/// 这样 `data` 形状不对时能和"请求被拒绝"区分开。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<JsonValue>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

/// 解析响应体并拆开信封
///
/// # 参数
/// - `endpoint`: 接口路径（仅用于错误信息）
/// - `status`: HTTP 状态码
/// - `body`: 原始响应体
///
/// # 返回
/// 成功时返回 `data`（可能为空）
pub fn unwrap_envelope<T>(endpoint: &str, status: u16, body: &[u8]) -> Result<Option<T>, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    let http_ok = (200..300).contains(&status);

    let envelope: ApiEnvelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(_) if !http_ok => {
            return Err(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status,
            })
        }
        Err(source) => {
            return Err(ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source,
            })
        }
    };

    if !envelope.success {
        let status_code = envelope.status_code.or(if http_ok { None } else { Some(status) });
        return Err(ApiError::Rejected {
            endpoint: endpoint.to_string(),
            status_code,
            message: envelope.message,
        });
    }

    match envelope.data {
        None | Some(JsonValue::Null) => Ok(None),
        Some(data) => serde_json::from_value(data)
            .map(Some)
            .map_err(|source| ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        id: i64,
    }

    #[test]
    fn test_success_returns_data() {
        let body = br#"{"success":true,"message":"Success","statusCode":200,"data":{"id":7}}"#;
        let data: Option<Payload> = unwrap_envelope("/exam/7", 200, body).unwrap();
        assert_eq!(data, Some(Payload { id: 7 }));
    }

    #[test]
    fn test_success_with_null_data() {
        let body = br#"{"success":true,"data":null}"#;
        let data: Option<Payload> = unwrap_envelope("/exam/7", 200, body).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn test_forbidden_body_is_rejected_with_status_code() {
        let body = br#"{"success":false,"statusCode":403,"message":"Max attempts reached. You have completed 2/2 attempts."}"#;
        let err = unwrap_envelope::<Payload>("/exam/7/start", 403, body).unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert!(err.user_message().starts_with("Max attempts reached"));
    }

    #[test]
    fn test_rejected_without_status_code_uses_http_status() {
        let body = br#"{"success":false,"message":"nope"}"#;
        let err = unwrap_envelope::<Payload>("/exam/7/start", 403, body).unwrap_err();
        assert_eq!(err.status_code(), Some(403));

        let err = unwrap_envelope::<Payload>("/exam/7/start", 200, body).unwrap_err();
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_non_envelope_error_body() {
        let err = unwrap_envelope::<Payload>("/exam/7", 502, b"<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::BadStatus { status: 502, .. }));
    }

    #[test]
    fn test_wrong_data_shape_is_parse_error() {
        let body = br#"{"success":true,"data":{"name":"x"}}"#;
        let err = unwrap_envelope::<Payload>("/exam/7", 200, body).unwrap_err();
        assert!(matches!(err, ApiError::JsonParseFailed { .. }));
    }
}
