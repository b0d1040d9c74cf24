//! Subject, HTML and plain-text bodies for each email kind.

use chrono::{DateTime, NaiveDate, Utc};

use domain::models::email::{
    AlertData, BudgetAlertData, ExpenseAddedData, SecurityAlertData, SpendingSummaryData,
    SubscriptionUpdateData, WelcomeData,
};
use domain::models::{EmailMessage, RenderedEmail};
use shared::currency::format_usd;

const STYLES: &str = r#"<style>
  body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 0; background-color: #f8fafc; }
  .container { max-width: 600px; margin: 0 auto; background-color: white; }
  .header { background: linear-gradient(135deg, #8B5CF6 0%, #3B82F6 100%); padding: 30px; text-align: center; }
  .header h1 { color: white; margin: 0; font-size: 24px; font-weight: bold; }
  .header p { color: #E0E7FF; margin: 10px 0 0 0; }
  .content { padding: 30px; }
  .card { background: #f8fafc; border-radius: 12px; padding: 20px; margin: 20px 0; border-left: 4px solid #8B5CF6; }
  .button { display: inline-block; background: linear-gradient(135deg, #8B5CF6 0%, #3B82F6 100%); color: white; padding: 12px 24px; text-decoration: none; border-radius: 8px; font-weight: 600; margin: 20px 0; }
  .footer { background: #f1f5f9; padding: 20px; text-align: center; color: #64748b; font-size: 14px; }
  .amount { font-size: 24px; font-weight: bold; color: #1e293b; }
  .category { background: #e0e7ff; color: #3730a3; padding: 4px 12px; border-radius: 20px; font-size: 14px; display: inline-block; }
  .alert { background: #fef2f2; border-left-color: #ef4444; }
  .success { background: #f0fdf4; border-left-color: #22c55e; }
  .warning { background: #fffbeb; border-left-color: #f59e0b; }
</style>"#;

const FOOTER: &str =
    "This email was sent from SmartSaver - Your AI-Powered Personal Finance Assistant";

/// Escapes text for interpolation into HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats an ISO date or timestamp for display; anything else is shown as given.
fn display_date(value: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return ts.format("%B %-d, %Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%B %-d, %Y").to_string();
    }
    value.to_string()
}

fn layout(title: &str, subtitle: &str, body: &str, footer_note: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1.0">{STYLES}</head>
<body>
  <div class="container">
    <div class="header"><h1>{title}</h1><p>{subtitle}</p></div>
    <div class="content">{body}</div>
    <div class="footer"><p>{FOOTER}</p><p>{footer_note}</p></div>
  </div>
</body>
</html>"#
    )
}

fn button(url: &str, label: &str) -> String {
    format!(r#"<a href="{}" class="button">{}</a>"#, escape_html(url), label)
}

/// Renders `message` for `user_name`. Links point at `frontend_url`.
pub fn render(message: &EmailMessage, user_name: &str, frontend_url: &str) -> RenderedEmail {
    let name = escape_html(user_name);
    match message {
        EmailMessage::Welcome(data) => welcome(data, user_name, &name, frontend_url),
        EmailMessage::ExpenseAdded(data) => expense_added(data, user_name, &name, frontend_url),
        EmailMessage::BudgetAlert(data) => budget_alert(data, user_name, &name, frontend_url),
        EmailMessage::SpendingSummary(data) => {
            spending_summary(data, user_name, &name, frontend_url)
        }
        EmailMessage::SecurityAlert(data) => security_alert(data, user_name, &name, frontend_url),
        EmailMessage::SubscriptionUpdate(data) => {
            subscription_update(data, user_name, &name, frontend_url)
        }
        EmailMessage::Alert(data) => alert(data, user_name, &name, frontend_url),
        EmailMessage::Generic => RenderedEmail {
            subject: "SmartSaver Notification".to_string(),
            html: format!("<p>Hi {name}, you have a new notification from SmartSaver.</p>"),
            text: format!("Hi {user_name}, you have a new notification from SmartSaver."),
        },
    }
}

fn welcome(data: &WelcomeData, user_name: &str, name: &str, frontend_url: &str) -> RenderedEmail {
    let created = data
        .registration_date
        .as_deref()
        .map(display_date)
        .unwrap_or_else(|| Utc::now().format("%B %-d, %Y").to_string());
    let features: String = data
        .features
        .iter()
        .map(|f| format!("<li>{}</li>", escape_html(f)))
        .collect();
    let dashboard = format!("{}/dashboard", frontend_url);

    let body = format!(
        r#"<h2>Hi {name}!</h2>
<p>Welcome to SmartSaver! We're thrilled to have you join our community of smart money managers.</p>
<div class="card success">
  <h3>You're All Set!</h3>
  <p><strong>Account Created:</strong> {created}</p>
</div>
<div class="card"><h3>What You Can Do Now</h3><ul>{features}</ul></div>
<div class="card">
  <h3>Get Started in 3 Easy Steps</h3>
  <ol>
    <li><strong>Add Your First Expense:</strong> Start tracking your spending today</li>
    <li><strong>Explore the Dashboard:</strong> See your financial insights come to life</li>
    <li><strong>Chat with AI:</strong> Get personalized financial advice anytime</li>
  </ol>
</div>
<div style="text-align: center;">{button}</div>"#,
        button = button(&dashboard, "Start Your Financial Journey"),
    );

    RenderedEmail {
        subject: "Welcome to SmartSaver - Your Financial Journey Starts Now!".to_string(),
        html: layout(
            "Welcome to SmartSaver!",
            "Your AI-Powered Personal Finance Assistant",
            &body,
            "You can manage your notification preferences in your profile settings.",
        ),
        text: format!(
            "Hi {user_name}! Welcome to SmartSaver! Your account was created on {created}. \
             Get started by adding your first expense and exploring our features: {}. \
             Visit {dashboard} to begin your financial journey!",
            data.features.join(", ")
        ),
    }
}

fn expense_added(
    data: &ExpenseAddedData,
    user_name: &str,
    name: &str,
    frontend_url: &str,
) -> RenderedEmail {
    let amount = format_usd(data.amount);
    let date = data
        .date
        .as_deref()
        .map(display_date)
        .unwrap_or_else(|| Utc::now().format("%B %-d, %Y").to_string());
    let notes_html = data
        .notes
        .as_deref()
        .map(|n| format!("<p><strong>Notes:</strong> {}</p>", escape_html(n)))
        .unwrap_or_default();
    let notes_text = data
        .notes
        .as_deref()
        .map(|n| format!(" Notes: {}.", n))
        .unwrap_or_default();
    let dashboard = format!("{}/dashboard", frontend_url);

    let body = format!(
        r#"<h2>Hi {name}!</h2>
<p>You've successfully added a new expense to your SmartSaver account.</p>
<div class="card">
  <div class="amount">{amount}</div>
  <p><strong>Category:</strong> <span class="category">{category}</span></p>
  <p><strong>Date:</strong> {date}</p>
  {notes_html}
</div>
<p>Keep tracking your expenses to maintain better financial awareness!</p>
{button}"#,
        category = escape_html(&data.category),
        button = button(&dashboard, "View Dashboard"),
    );

    RenderedEmail {
        subject: format!("New Expense Added - {}", amount),
        html: layout(
            "SmartSaver",
            "Expense Tracking Notification",
            &body,
            "You can manage your notification preferences in your profile settings.",
        ),
        text: format!(
            "Hi {user_name}! You've added a new expense: {amount} in {} category on {date}.{notes_text} \
             View your dashboard at {dashboard}",
            data.category
        ),
    }
}

fn budget_alert(
    data: &BudgetAlertData,
    user_name: &str,
    name: &str,
    frontend_url: &str,
) -> RenderedEmail {
    let spent = format_usd(data.spent);
    let budget = format_usd(data.budget);
    let remaining = format_usd(data.budget - data.spent);
    let usage = format!("{:.1}%", data.usage_percent());
    let category = escape_html(&data.category);

    let body = format!(
        r#"<h2>Budget Alert!</h2>
<p>Hi {name}, you're approaching your budget limit for the <strong>{category}</strong> category.</p>
<div class="card alert">
  <h3>Budget Status</h3>
  <p><strong>Category:</strong> <span class="category">{category}</span></p>
  <p><strong>Spent:</strong> {spent} / {budget}</p>
  <p><strong>Remaining:</strong> {remaining}</p>
  <p><strong>Usage:</strong> {usage}</p>
</div>
<p>Consider reviewing your spending in this category to stay within your budget goals.</p>
{button}"#,
        button = button(&format!("{}/dashboard", frontend_url), "Review Spending"),
    );

    RenderedEmail {
        subject: format!("Budget Alert - {} Category", data.category),
        html: layout(
            "SmartSaver",
            "Budget Alert Notification",
            &body,
            "Budget alerts help you stay on track with your financial goals.",
        ),
        text: format!(
            "Budget Alert! Hi {user_name}, you've spent {spent} of your {budget} budget for {} ({usage}). \
             Consider reviewing your spending to stay within budget.",
            data.category
        ),
    }
}

fn spending_summary(
    data: &SpendingSummaryData,
    user_name: &str,
    name: &str,
    frontend_url: &str,
) -> RenderedEmail {
    let total = format_usd(data.total_spent);
    let period = escape_html(&data.period);
    let categories_html: String = data
        .top_categories
        .iter()
        .map(|c| {
            format!(
                r#"<p><span class="category">{}</span> - {}</p>"#,
                escape_html(&c.category),
                format_usd(c.amount)
            )
        })
        .collect();
    let insights = data
        .insights
        .as_deref()
        .map(|i| {
            format!(
                r#"<div class="card success"><h3>AI Insights</h3><p>{}</p></div>"#,
                escape_html(i)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h2>Your {period} Financial Summary</h2>
<p>Hi {name}, here's your spending overview for the past {period_lower}.</p>
<div class="card">
  <h3>Total Spending</h3>
  <div class="amount">{total}</div>
  <p>Across {count} transactions</p>
</div>
<div class="card"><h3>Top Categories</h3>{categories_html}</div>
{insights}
{button}"#,
        period_lower = period.to_lowercase(),
        count = data.transaction_count,
        button = button(&format!("{}/dashboard", frontend_url), "View Full Report"),
    );

    let categories_text = data
        .top_categories
        .iter()
        .map(|c| format!("{}: {}", c.category, format_usd(c.amount)))
        .collect::<Vec<_>>()
        .join(", ");

    RenderedEmail {
        subject: format!("Your {} Spending Summary", data.period),
        html: layout(
            "SmartSaver",
            &format!("{} Spending Summary", period),
            &body,
            "Regular summaries help you stay informed about your spending patterns.",
        ),
        text: format!(
            "Hi {user_name}, your {} Spending Summary: Total spent {total} across {} transactions. \
             Top categories: {categories_text}.",
            data.period, data.transaction_count
        ),
    }
}

fn security_alert(
    data: &SecurityAlertData,
    user_name: &str,
    name: &str,
    frontend_url: &str,
) -> RenderedEmail {
    let enabled = data.action.contains("enabled");
    let when = Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
    let ip = data.ip_address.as_deref().unwrap_or("Unknown");
    let closing = if enabled {
        "Great! Your account is now more secure with Two-Factor Authentication enabled."
    } else {
        "If you didn't make this change, please contact our support team immediately."
    };

    let body = format!(
        r#"<h2>Security Update</h2>
<p>Hi {name}, there's been a security change on your SmartSaver account.</p>
<div class="card {class}">
  <h3>Security Action</h3>
  <p><strong>Action:</strong> {action}</p>
  <p><strong>Time:</strong> {when}</p>
  <p><strong>IP Address:</strong> {ip}</p>
</div>
<p>{closing}</p>
{button}"#,
        class = if enabled { "success" } else { "warning" },
        action = escape_html(&data.action),
        ip = escape_html(ip),
        button = button(&format!("{}/profile", frontend_url), "Review Security Settings"),
    );

    RenderedEmail {
        subject: format!("Security Update - {}", data.action),
        html: layout(
            "SmartSaver",
            "Security Notification",
            &body,
            "We notify you of all security changes to keep your account safe.",
        ),
        text: format!(
            "Hi {user_name}, security update: {} on your SmartSaver account at {when}. \
             If you didn't make this change, please contact support.",
            data.action
        ),
    }
}

fn subscription_update(
    data: &SubscriptionUpdateData,
    user_name: &str,
    name: &str,
    frontend_url: &str,
) -> RenderedEmail {
    let plan = escape_html(&data.plan_name);
    let next_billing = data
        .next_billing_date
        .as_deref()
        .map(|d| {
            format!(
                "<p><strong>Next Billing:</strong> {}</p>",
                escape_html(&display_date(d))
            )
        })
        .unwrap_or_default();
    let profile = format!("{}/profile", frontend_url);

    let body = format!(
        r#"<h2>Subscription Update</h2>
<p>Hi {name}, your SmartSaver subscription has been updated.</p>
<div class="card">
  <h3>Subscription Details</h3>
  <p><strong>Plan:</strong> {plan}</p>
  <p><strong>Status:</strong> {status}</p>
  <p><strong>Action:</strong> {action}</p>
  {next_billing}
</div>
<p>Thank you for being a SmartSaver {plan} member!</p>
{button}"#,
        status = escape_html(&data.status),
        action = escape_html(&data.action),
        button = button(&profile, "Manage Subscription"),
    );

    RenderedEmail {
        subject: format!("Subscription Update - {}", data.action),
        html: layout(
            "SmartSaver",
            "Subscription Notification",
            &body,
            "Questions about your subscription? Contact our support team.",
        ),
        text: format!(
            "Hi {user_name}, your SmartSaver {} subscription has been {}. Status: {}. \
             Manage your subscription at {profile}",
            data.plan_name, data.action, data.status
        ),
    }
}

fn alert(data: &AlertData, user_name: &str, name: &str, frontend_url: &str) -> RenderedEmail {
    let body = format!(
        r#"<h2>Hi {name}!</h2>
<div class="card warning">
  <h3>{title}</h3>
  <p>{message}</p>
</div>
{button}"#,
        title = escape_html(&data.title),
        message = escape_html(&data.message),
        button = button(&format!("{}/notifications", frontend_url), "View Notifications"),
    );

    RenderedEmail {
        subject: data.title.clone(),
        html: layout(
            "SmartSaver",
            "Account Alert",
            &body,
            "You can manage your notification preferences in your profile settings.",
        ),
        text: format!("Hi {user_name}, {}: {}", data.title, data.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FRONTEND: &str = "https://smartsaver.app";

    fn render_kind(kind: &str, data: serde_json::Value) -> RenderedEmail {
        let message = EmailMessage::from_request(kind, data).unwrap();
        render(&message, "Alex", FRONTEND)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("2024-03-05"), "March 5, 2024");
        assert_eq!(display_date("2024-03-05T10:00:00Z"), "March 5, 2024");
        assert_eq!(display_date("next week"), "next week");
    }

    #[test]
    fn test_budget_alert_copy() {
        let email = render_kind(
            "budget_alert",
            json!({ "category": "Food", "spent": 80, "budget": 100 }),
        );
        assert_eq!(email.subject, "Budget Alert - Food Category");
        assert!(email.text.contains("$80.00 of your $100.00"));
        assert!(email.text.contains("(80.0%)"));
        assert!(email.html.contains("Remaining:</strong> $20.00"));
    }

    #[test]
    fn test_expense_added_copy() {
        let email = render_kind(
            "expense_added",
            json!({ "amount": 12.5, "category": "Coffee", "date": "2024-01-02", "notes": "<script>" }),
        );
        assert_eq!(email.subject, "New Expense Added - $12.50");
        assert!(email.text.contains("January 2, 2024"));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
    }

    #[test]
    fn test_welcome_lists_features() {
        let email = render_kind(
            "welcome",
            json!({ "registrationDate": "2024-06-01", "features": ["Budgets", "Insights"] }),
        );
        assert!(email.subject.starts_with("Welcome to SmartSaver"));
        assert!(email.html.contains("<li>Budgets</li>"));
        assert!(email.text.contains("Budgets, Insights"));
        assert!(email.text.contains("https://smartsaver.app/dashboard"));
    }

    #[test]
    fn test_security_alert_tone() {
        let enabled = render_kind("security_alert", json!({ "action": "2FA enabled" }));
        assert!(enabled.html.contains("card success"));
        assert!(enabled.html.contains("IP Address:</strong> Unknown"));

        let disabled = render_kind("security_alert", json!({ "action": "2FA disabled" }));
        assert!(disabled.html.contains("card warning"));
        assert!(disabled.html.contains("contact our support team"));
    }

    #[test]
    fn test_spending_summary_categories() {
        let email = render_kind(
            "spending_summary",
            json!({
                "period": "Weekly",
                "totalSpent": 420.0,
                "transactionCount": 12,
                "topCategories": [{ "category": "Food", "amount": 200 }, { "category": "Travel", "amount": 120 }]
            }),
        );
        assert_eq!(email.subject, "Your Weekly Spending Summary");
        assert!(email.text.contains("Food: $200.00, Travel: $120.00"));
        assert!(email.html.contains("past weekly"));
    }

    #[test]
    fn test_subscription_update_optional_billing_date() {
        let email = render_kind(
            "subscription_update",
            json!({ "planName": "Pro", "status": "active", "action": "upgraded" }),
        );
        assert_eq!(email.subject, "Subscription Update - upgraded");
        assert!(!email.html.contains("Next Billing"));
    }

    #[test]
    fn test_generic_fallback() {
        let email = render_kind("something_else", json!({}));
        assert_eq!(email.subject, "SmartSaver Notification");
        assert_eq!(
            email.text,
            "Hi Alex, you have a new notification from SmartSaver."
        );
    }

    #[test]
    fn test_alert_template() {
        let email = render_kind(
            "alert",
            json!({ "title": "Low Balance Alert - Checking", "message": "Balance is $50.00" }),
        );
        assert_eq!(email.subject, "Low Balance Alert - Checking");
        assert!(email.text.contains("Balance is $50.00"));
        assert!(email.html.contains("https://smartsaver.app/notifications"));
    }
}
