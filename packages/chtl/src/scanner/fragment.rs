//! The fragment data model produced by the unified scanner.

use crate::source::SourceSpan;
use serde::{Deserialize, Serialize};

pub type FragmentId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentType {
    Chtl,
    ChtlJs,
    Css,
    Js,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentContext {
    Global,
    HtmlElement,
    StyleBlock,
    ScriptBlock,
    FunctionBody,
    TemplateBlock,
    CustomBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Integrity {
    Complete,
    Partial,
    Incomplete,
    Merged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    pub fragment_type: FragmentType,
    pub content: String,
    pub span: SourceSpan,
    pub context: FragmentContext,
    pub integrity: Integrity,
    pub dependencies: Vec<FragmentId>,
    pub dependents: Vec<FragmentId>,
    /// `0` means no parent.
    pub parent_id: FragmentId,
    pub children: Vec<FragmentId>,
    pub merge_order: u32,
    pub trigger_keyword: Option<String>,
    pub contained_keywords: Vec<String>,
    pub is_minimal_unit: bool,
}

impl Fragment {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.span.range()
    }
}
