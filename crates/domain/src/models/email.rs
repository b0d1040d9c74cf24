//! Transactional email models.

use serde::{Deserialize, Serialize};

/// Request payload for `POST /send-email-notification`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(rename = "type", default)]
    pub email_type: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Response payload for a successful send.
#[derive(Debug, Clone, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "type")]
    pub email_type: String,
    pub recipient: String,
}

/// Rendered email ready for a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeData {
    #[serde(default)]
    pub registration_date: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseAddedData {
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlertData {
    pub category: String,
    pub spent: f64,
    pub budget: f64,
}

impl BudgetAlertData {
    /// Share of the budget used, in percent. Zero when the budget is zero.
    pub fn usage_percent(&self) -> f64 {
        if self.budget > 0.0 {
            self.spent / self.budget * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAmount {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummaryData {
    pub period: String,
    pub total_spent: f64,
    #[serde(default)]
    pub transaction_count: i64,
    #[serde(default)]
    pub top_categories: Vec<CategoryAmount>,
    #[serde(default)]
    pub insights: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlertData {
    pub action: String,
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdateData {
    pub plan_name: String,
    pub status: String,
    pub action: String,
    #[serde(default)]
    pub next_billing_date: Option<String>,
}

/// Rule-engine notification forwarded by email.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertData {
    pub title: String,
    pub message: String,
}

/// An email with its template selected and data typed.
#[derive(Debug, Clone)]
pub enum EmailMessage {
    Welcome(WelcomeData),
    ExpenseAdded(ExpenseAddedData),
    BudgetAlert(BudgetAlertData),
    SpendingSummary(SpendingSummaryData),
    SecurityAlert(SecurityAlertData),
    SubscriptionUpdate(SubscriptionUpdateData),
    Alert(AlertData),
    /// Unknown type: a generic "you have a new notification" email.
    Generic,
}

impl EmailMessage {
    /// Selects the template for `kind` and parses `data` into its fields.
    pub fn from_request(kind: &str, data: serde_json::Value) -> Result<Self, serde_json::Error> {
        let message = match kind {
            "welcome" => {
                if data.is_null() {
                    EmailMessage::Welcome(WelcomeData::default())
                } else {
                    EmailMessage::Welcome(serde_json::from_value(data)?)
                }
            }
            "expense_added" => EmailMessage::ExpenseAdded(serde_json::from_value(data)?),
            "budget_alert" => EmailMessage::BudgetAlert(serde_json::from_value(data)?),
            "spending_summary" => EmailMessage::SpendingSummary(serde_json::from_value(data)?),
            "security_alert" => EmailMessage::SecurityAlert(serde_json::from_value(data)?),
            "subscription_update" => {
                EmailMessage::SubscriptionUpdate(serde_json::from_value(data)?)
            }
            "alert" => EmailMessage::Alert(serde_json::from_value(data)?),
            _ => EmailMessage::Generic,
        };
        Ok(message)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EmailMessage::Welcome(_) => "welcome",
            EmailMessage::ExpenseAdded(_) => "expense_added",
            EmailMessage::BudgetAlert(_) => "budget_alert",
            EmailMessage::SpendingSummary(_) => "spending_summary",
            EmailMessage::SecurityAlert(_) => "security_alert",
            EmailMessage::SubscriptionUpdate(_) => "subscription_update",
            EmailMessage::Alert(_) => "alert",
            EmailMessage::Generic => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_deserialization() {
        let req: SendEmailRequest = serde_json::from_value(json!({
            "type": "budget_alert",
            "userEmail": "saver@example.com",
            "data": { "category": "Food", "spent": 80, "budget": 100 }
        }))
        .unwrap();
        assert_eq!(req.email_type.as_deref(), Some("budget_alert"));
        assert_eq!(req.user_email.as_deref(), Some("saver@example.com"));
        assert!(req.user_name.is_none());
    }

    #[test]
    fn test_from_request_typed() {
        let msg = EmailMessage::from_request(
            "budget_alert",
            json!({ "category": "Food", "spent": 80, "budget": 100 }),
        )
        .unwrap();
        match msg {
            EmailMessage::BudgetAlert(data) => {
                assert_eq!(data.category, "Food");
                assert!((data.usage_percent() - 80.0).abs() < 1e-9);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_from_request_missing_fields_fails() {
        assert!(EmailMessage::from_request("expense_added", json!({ "category": "Food" })).is_err());
    }

    #[test]
    fn test_from_request_unknown_is_generic() {
        let msg = EmailMessage::from_request("low_balance", json!({})).unwrap();
        assert!(matches!(msg, EmailMessage::Generic));
    }

    #[test]
    fn test_welcome_accepts_null_data() {
        let msg = EmailMessage::from_request("welcome", serde_json::Value::Null).unwrap();
        assert_eq!(msg.kind(), "welcome");
    }

    #[test]
    fn test_budget_usage_with_zero_budget() {
        let data = BudgetAlertData {
            category: "Food".to_string(),
            spent: 10.0,
            budget: 0.0,
        };
        assert_eq!(data.usage_percent(), 0.0);
    }
}
