use crate::error::SessionError;

/// 当前题目指针，自由跳转，前后翻页不循环
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: usize,
    len: usize,
}

impl Navigator {
    pub fn new(len: usize) -> Self {
        Self { current: 0, len }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.len == 0 || self.current + 1 == self.len
    }

    /// 跳到任意题目（不要求前面的题目已作答）
    pub fn go_to(&mut self, index: usize) -> Result<usize, SessionError> {
        if index >= self.len {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        self.current = index;
        Ok(self.current)
    }

    pub fn next(&mut self) -> usize {
        if self.current + 1 < self.len {
            self.current += 1;
        }
        self.current
    }

    pub fn previous(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }
}
