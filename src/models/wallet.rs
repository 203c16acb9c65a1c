use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCurrency {
    pub code: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Wallet (cash, bank account, card...) owned by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub currency: Option<WalletCurrency>,
}

impl Wallet {
    /// Wallets without an explicit flag are treated as active
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    pub fn currency_code(&self) -> Option<&str> {
        self.currency.as_ref().map(|c| c.code.as_str())
    }
}
