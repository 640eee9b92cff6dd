//! 答题卡：题目 → 所选选项，以及标记复查的题目集合

use std::collections::{HashMap, HashSet};

use crate::models::{AnswerId, AnswerSubmission, QuestionId, SessionQuestion, SubmitExamRequest};

#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    selections: HashMap<QuestionId, AnswerId>,
    flagged: HashSet<QuestionId>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 选择选项，覆盖之前的选择
    ///
    /// # 返回
    /// 之前选择的选项（如果有）
    pub fn select(&mut self, question_id: QuestionId, answer_id: AnswerId) -> Option<AnswerId> {
        self.selections.insert(question_id, answer_id)
    }

    pub fn selected(&self, question_id: QuestionId) -> Option<AnswerId> {
        self.selections.get(&question_id).copied()
    }

    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.selections.contains_key(&question_id)
    }

    /// 切换标记状态
    ///
    /// # 返回
    /// 切换后是否处于标记状态
    pub fn toggle_flag(&mut self, question_id: QuestionId) -> bool {
        if self.flagged.remove(&question_id) {
            false
        } else {
            self.flagged.insert(question_id);
            true
        }
    }

    pub fn is_flagged(&self, question_id: QuestionId) -> bool {
        self.flagged.contains(&question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged.len()
    }

    /// 未作答题数
    pub fn unanswered_count(&self, questions: &[SessionQuestion]) -> usize {
        questions.iter().filter(|q| !self.is_answered(q.id)).count()
    }

    /// 按题目顺序生成交卷请求，未作答的题目不出现
    pub fn to_submission(&self, questions: &[SessionQuestion]) -> SubmitExamRequest {
        let answers = questions
            .iter()
            .filter_map(|q| {
                self.selected(q.id).map(|answer_id| AnswerSubmission {
                    question_id: q.id,
                    selected_answer_id: answer_id,
                })
            })
            .collect();
        SubmitExamRequest { answers }
    }
}
