//! 考试题目
//!
//! 后端的题目列表有多种形状：裸数组、`{questions}`、`{items}`、`{content}`，
//! 数组元素又可能是题目本身或 `{id, orderIndex, points, question}` 包装。
//! 这里统一归一化为 [`SessionQuestion`]。

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

pub type QuestionId = i64;
pub type AnswerId = i64;

/// 题目文本缺失时显示的占位
pub const MISSING_QUESTION_TEXT: &str = "Question text not available";

/// 会话内的一道题（获取后不再变化）
#[derive(Debug, Clone, PartialEq)]
pub struct SessionQuestion {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<AnswerOption>,
    pub points: Option<f64>,
    pub difficulty_level: Option<u32>,
    pub question_type: Option<String>,
    pub order_index: Option<u32>,
}

impl SessionQuestion {
    /// 该题是否包含指定选项
    pub fn has_option(&self, answer_id: AnswerId) -> bool {
        self.options.iter().any(|o| o.id == answer_id)
    }

    /// 按字母（A、B、C…）查找选项
    pub fn option_by_letter(&self, letter: char) -> Option<&AnswerOption> {
        let upper = letter.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        let index = (upper as u8 - b'A') as usize;
        self.options.get(index)
    }
}

/// 答案选项
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
    pub order_index: Option<u32>,
}

/// 选项在列表中的字母标签，超过 Z 时没有字母
pub fn option_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
}

/// 后端题目 DTO（字段全部宽松处理）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    #[serde(default)]
    pub id: Option<QuestionId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<u32>,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub order_index: Option<u32>,
    #[serde(default)]
    pub options: Option<Vec<AnswerOptionDto>>,
    #[serde(default)]
    pub answers: Option<Vec<AnswerOptionDto>>,
}

/// 试卷中的题目包装 `{id, orderIndex, points, question}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestionDto {
    #[serde(default)]
    pub order_index: Option<u32>,
    #[serde(default)]
    pub points: Option<f64>,
    pub question: QuestionDto,
}

/// 选项 DTO：可能是纯文本，也可能是对象
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnswerOptionDto {
    Text(String),
    Object {
        #[serde(default)]
        id: Option<AnswerId>,
        #[serde(default, rename = "answerText")]
        answer_text: Option<String>,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default, rename = "orderIndex")]
        order_index: Option<u32>,
    },
}

/// 题目列表中的一项
#[derive(Debug, Clone)]
pub enum QuestionEntry {
    Nested(ExamQuestionDto),
    Flat(QuestionDto),
}

/// `GET /exam/{id}/questions` 的 `data` 部分
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionsPayload {
    Bare(Vec<JsonValue>),
    Questions { questions: Vec<JsonValue> },
    Items { items: Vec<JsonValue> },
    Content { content: Vec<JsonValue> },
    Unrecognized(JsonValue),
}

impl QuestionsPayload {
    /// 归一化为会话题目列表
    ///
    /// 无法识别的形状退化为空列表；单个元素解析失败或缺少 id 时只跳过该元素。
    pub fn into_questions(self) -> Vec<SessionQuestion> {
        let entries = match self {
            QuestionsPayload::Bare(entries) => entries,
            QuestionsPayload::Questions { questions } => questions,
            QuestionsPayload::Items { items } => items,
            QuestionsPayload::Content { content } => content,
            QuestionsPayload::Unrecognized(value) => {
                warn!("⚠️ 无法识别的题目列表格式，按空列表处理: {}", shape_of(&value));
                Vec::new()
            }
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(position, value)| {
                let entry = match QuestionEntry::from_value(value) {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("⚠️ 跳过无法解析的题目 (位置 {}): {}", position + 1, e);
                        return None;
                    }
                };
                let question = entry.into_session_question();
                if question.is_none() {
                    debug!("跳过缺少 id 的题目 (位置 {})", position + 1);
                }
                question
            })
            .collect()
    }
}

impl QuestionEntry {
    /// 带 `question` 对象的元素按包装解析，其余按题目本身解析
    pub fn from_value(value: JsonValue) -> Result<Self, serde_json::Error> {
        if value.get("question").is_some_and(JsonValue::is_object) {
            serde_json::from_value(value).map(QuestionEntry::Nested)
        } else {
            serde_json::from_value(value).map(QuestionEntry::Flat)
        }
    }

    fn into_session_question(self) -> Option<SessionQuestion> {
        match self {
            QuestionEntry::Nested(wrapper) => {
                let ExamQuestionDto {
                    order_index,
                    points,
                    question,
                } = wrapper;
                let mut converted = question.into_session_question()?;
                converted.points = points.or(converted.points);
                converted.order_index = order_index.or(converted.order_index);
                Some(converted)
            }
            QuestionEntry::Flat(question) => question.into_session_question(),
        }
    }
}

impl QuestionDto {
    fn into_session_question(self) -> Option<SessionQuestion> {
        let id = self.id?;
        let text = [&self.content, &self.question_text, &self.title]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| MISSING_QUESTION_TEXT.to_string());

        let options = self
            .options
            .or(self.answers)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, option)| option.into_answer_option(index))
            .collect();

        Some(SessionQuestion {
            id,
            text,
            options,
            points: self.points,
            difficulty_level: self.difficulty_level,
            question_type: self.question_type,
            order_index: self.order_index,
        })
    }
}

impl AnswerOptionDto {
    fn into_answer_option(self, index: usize) -> AnswerOption {
        match self {
            AnswerOptionDto::Text(text) => AnswerOption {
                id: index as AnswerId,
                text,
                order_index: None,
            },
            AnswerOptionDto::Object {
                id,
                answer_text,
                content,
                text,
                order_index,
            } => {
                let text = [answer_text, content, text]
                    .into_iter()
                    .flatten()
                    .find(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| format!("Option {}", index + 1));
                AnswerOption {
                    id: id.unwrap_or(index as AnswerId),
                    text,
                    order_index,
                }
            }
        }
    }
}

fn shape_of(value: &JsonValue) -> String {
    match value {
        JsonValue::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("对象 keys=[{}]", keys.join(", "))
        }
        JsonValue::Array(_) => "数组".to_string(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}
