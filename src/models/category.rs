use serde::{Deserialize, Serialize};

/// Whether a category tracks money going out or coming in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Expense,
    Income,
}

impl CategoryType {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "expense" => Ok(CategoryType::Expense),
            "income" => Ok(CategoryType::Income),
            _ => Err(format!("Invalid category type: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Expense => "expense",
            CategoryType::Income => "income",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub r#type: CategoryType,
    pub name: String,
    #[serde(default)]
    pub parent: Option<i64>,
}
