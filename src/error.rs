//! Unified compiler error type used across all pipeline stages.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Migrate,
    Validate,
    Normalize,
    Connect,
    Enrich,
    Interpret,
    Analyze,
    Ir,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Parse => write!(f, "Parse"),
            Stage::Migrate => write!(f, "Migrate"),
            Stage::Validate => write!(f, "Validate"),
            Stage::Normalize => write!(f, "Normalize"),
            Stage::Connect => write!(f, "Connect"),
            Stage::Enrich => write!(f, "Enrich"),
            Stage::Interpret => write!(f, "Interpret"),
            Stage::Analyze => write!(f, "Analyze"),
            Stage::Ir => write!(f, "IR"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub stage: Stage,
    pub message: String,
    pub node_id: Option<String>,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "[{}] {} (node '{}')", self.stage, self.message, id),
            None => write!(f, "[{}] {}", self.stage, self.message),
        }
    }
}

impl std::error::Error for CompileError {}

impl CompileError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        CompileError {
            stage,
            message: message.into(),
            node_id: None,
        }
    }

    pub fn for_node(stage: Stage, message: impl Into<String>, node_id: impl Into<String>) -> Self {
        CompileError {
            stage,
            message: message.into(),
            node_id: Some(node_id.into()),
        }
    }
}
