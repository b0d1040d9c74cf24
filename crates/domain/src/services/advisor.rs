//! Scripted financial advisor.
//!
//! Picks a response template from keywords in the user's message and fills it
//! with figures computed from the supplied expenses. No external model is
//! involved, so the output is deterministic for a given request.

use std::collections::BTreeMap;

use crate::models::AdvisorRequest;

/// Savings target used when there is no spending to derive one from.
const FALLBACK_MONTHLY_SAVINGS: f64 = 100.0;

/// Which template a message selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceTopic {
    SpendingAnalysis,
    BudgetPlan,
    Savings,
    Reduction,
    General,
}

impl AdviceTopic {
    /// Keyword match in priority order, case-insensitive.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["analyze", "spending", "review"]) {
            AdviceTopic::SpendingAnalysis
        } else if has(&["budget", "plan"]) {
            AdviceTopic::BudgetPlan
        } else if has(&["save", "savings", "goal"]) {
            AdviceTopic::Savings
        } else if has(&["reduce", "cut", "lower"]) {
            AdviceTopic::Reduction
        } else {
            AdviceTopic::General
        }
    }
}

/// Spending totals derived from a request.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingSnapshot {
    pub total: f64,
    /// Categories by descending amount; ties sorted by name.
    pub categories: Vec<(String, f64)>,
    /// Percent of income left after spending, zero without income.
    pub savings_rate: f64,
}

impl SpendingSnapshot {
    pub fn from_request(request: &AdvisorRequest) -> Self {
        let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
        for expense in &request.expenses {
            *by_category.entry(expense.category.as_str()).or_insert(0.0) += expense.amount;
        }

        let mut categories: Vec<(String, f64)> = by_category
            .into_iter()
            .map(|(c, a)| (c.to_string(), a))
            .collect();
        categories.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total: f64 = request.expenses.iter().map(|e| e.amount).sum();
        let savings_rate = match request.income {
            Some(income) if income > 0.0 => (income - total) / income * 100.0,
            _ => 0.0,
        };

        Self {
            total,
            categories,
            savings_rate,
        }
    }

    pub fn top(&self) -> Option<(&str, f64)> {
        self.categories.first().map(|(c, a)| (c.as_str(), *a))
    }

    /// Share of total spending, zero when nothing was spent.
    pub fn share_of_total(&self, amount: f64) -> f64 {
        if self.total > 0.0 {
            amount / self.total * 100.0
        } else {
            0.0
        }
    }
}

/// Generates advice for a request.
pub fn generate_advice(request: &AdvisorRequest) -> String {
    let snapshot = SpendingSnapshot::from_request(request);
    match AdviceTopic::from_message(&request.message) {
        AdviceTopic::SpendingAnalysis => spending_analysis(&snapshot),
        AdviceTopic::BudgetPlan => budget_plan(&snapshot),
        AdviceTopic::Savings => savings_strategy(&snapshot),
        AdviceTopic::Reduction => reduction_tips(&snapshot),
        AdviceTopic::General => general_guidance(&snapshot),
    }
}

fn spending_analysis(s: &SpendingSnapshot) -> String {
    let top_three: Vec<String> = s
        .categories
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, (category, amount))| {
            format!(
                "{}. {}: ${:.2} ({:.1}%)",
                i + 1,
                category,
                amount,
                s.share_of_total(*amount)
            )
        })
        .collect();

    let (top_name, top_amount) = s.top().unwrap_or(("miscellaneous", 0.0));
    let savings_note = if s.savings_rate > 20.0 {
        "Great job! You're saving well."
    } else {
        "Consider increasing your savings rate to 20% of income"
    };
    let limit_target = if s.categories.is_empty() {
        "your top category"
    } else {
        top_name
    };

    format!(
        "**SmartSaver Spending Analysis:**\n\n\
         **Top Spending Categories:**\n{}\n\n\
         **Key Insights:**\n\
         • Your highest spending is on {} at {:.1}% of total expenses\n\
         • {}\n\n\
         **Actionable Steps:**\n\
         1. Set a weekly limit of ${:.0} for {}\n\
         2. Track daily expenses for 2 weeks to identify patterns\n\
         3. Use the envelope method for discretionary spending\n\
         4. Review and cancel unused subscriptions monthly",
        top_three.join("\n"),
        top_name,
        s.share_of_total(top_amount),
        savings_note,
        top_amount / 4.0,
        limit_target
    )
}

fn budget_plan(s: &SpendingSnapshot) -> String {
    let needs = s.total * 0.5;
    let wants = s.total * 0.3;
    let savings = s.total * 0.2;
    let focus = s.top().map(|(c, _)| c).unwrap_or("food");

    format!(
        "**SmartSaver Budget Plan:**\n\n\
         **50/30/20 Rule Applied to Your Spending:**\n\
         • **Needs (50%):** ${:.2} - Rent, groceries, utilities\n\
         • **Wants (30%):** ${:.2} - Entertainment, dining out\n\
         • **Savings (20%):** ${:.2} - Emergency fund, investments\n\n\
         **Your Current vs. Recommended:**\n\
         • Current spending: ${:.2}\n\
         • Recommended total: ${:.2}\n\
         • Potential savings: ${:.2}\n\n\
         **Implementation Steps:**\n\
         1. Automate ${:.0} weekly transfers to savings\n\
         2. Allocate {} budget to ${:.0}/month\n\
         3. Use separate accounts for needs vs. wants\n\
         4. Review weekly to stay on track",
        needs,
        wants,
        savings,
        s.total,
        needs + wants,
        savings,
        savings / 4.0,
        focus,
        wants * 0.4
    )
}

fn months_to(goal: f64, monthly: f64) -> String {
    if monthly > 0.0 {
        format!("{} months", (goal / monthly).ceil())
    } else {
        "n/a".to_string()
    }
}

fn savings_strategy(s: &SpendingSnapshot) -> String {
    let (focus, monthly) = match s.top() {
        Some((category, amount)) => (category, amount * 0.2),
        None => ("top category", FALLBACK_MONTHLY_SAVINGS),
    };
    let emergency_fund = s.total * 3.0;

    format!(
        "**SmartSaver Savings Strategy & Projections:**\n\n\
         **Immediate Opportunities:**\n\
         • Reduce {} by 20% = ${:.2}/month saved\n\
         • Annual impact: ${:.2} additional savings\n\n\
         **Savings Timeline Projections:**\n\
         • Emergency Fund (${:.2}): {}\n\
         • Vacation Fund ($3,000): {}\n\
         • Investment Goal ($10,000): {}\n\n\
         **Action Plan:**\n\
         1. **Week 1:** Set up automatic ${:.0} weekly transfers\n\
         2. **Week 2:** Negotiate bills (phone, insurance) for $50+ monthly savings\n\
         3. **Week 3:** Use cashback apps for groceries (2-5% back)\n\
         4. **Week 4:** Review and optimize subscriptions\n\
         5. **Month 2:** Increase savings by another ${:.0}",
        focus,
        monthly,
        monthly * 12.0,
        emergency_fund,
        months_to(emergency_fund, monthly),
        months_to(3000.0, monthly),
        months_to(10000.0, monthly),
        monthly / 4.0,
        monthly * 0.5
    )
}

fn reduction_tips(s: &SpendingSnapshot) -> String {
    let (focus, current) = s.top().unwrap_or(("Food", 0.0));

    [
        format!("**{} Reduction Tips:**", focus),
        format!("• Current: ${:.2}/month", current),
        format!("• Target: ${:.2}/month (20% reduction)", current * 0.8),
        format!("• Monthly savings: ${:.2}", current * 0.2),
        String::new(),
        "**Specific Actions:**".to_string(),
        "1. Meal prep Sundays (save $15-20/week)".to_string(),
        "2. Generic brands for staples (save 20-30%)".to_string(),
        "3. Limit eating out to once weekly".to_string(),
        "4. Use grocery store apps for discounts".to_string(),
        "5. Buy seasonal produce and freeze extras".to_string(),
    ]
    .join("\n")
}

fn general_guidance(s: &SpendingSnapshot) -> String {
    let category_count = s.categories.len();
    let average = if category_count > 0 {
        s.total / category_count as f64
    } else {
        0.0
    };

    format!(
        "**SmartSaver Personalized Financial Guidance:**\n\n\
         **Your Financial Snapshot:**\n\
         • Total tracked expenses: ${:.2}\n\
         • Number of categories: {}\n\
         • Average per category: ${:.2}\n\n\
         **Smart Money Moves:**\n\
         1. **Automate Success:** Set up automatic transfers for savings right after payday\n\
         2. **Track Everything:** Use the 30-day rule - track every expense to identify patterns\n\
         3. **Optimize Big Wins:** Focus on your top 3 spending categories for maximum impact\n\
         4. **Emergency Buffer:** Build ${:.2} emergency fund (3 months expenses)\n\n\
         **This Week's Challenge:**\n\
         Try the \"24-hour rule\" - wait a day before any non-essential purchase over $50. \
         This simple habit can reduce impulse spending by 30-40%.\n\n\
         Need specific advice? Ask me about budgeting, saving for goals, or reducing expenses in any category!",
        s.total,
        category_count,
        average,
        s.total * 3.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::advisor::ExpenseInput;

    fn expense(amount: f64, category: &str) -> ExpenseInput {
        ExpenseInput {
            id: None,
            amount,
            category: category.to_string(),
            date: None,
            notes: None,
        }
    }

    fn request(message: &str, expenses: Vec<ExpenseInput>, income: Option<f64>) -> AdvisorRequest {
        AdvisorRequest {
            message: message.to_string(),
            expenses,
            income,
            goals: Vec::new(),
        }
    }

    fn sample_expenses() -> Vec<ExpenseInput> {
        vec![
            expense(200.0, "Food"),
            expense(100.0, "Food"),
            expense(120.0, "Transport"),
            expense(80.0, "Fun"),
        ]
    }

    #[test]
    fn test_topic_selection() {
        assert_eq!(AdviceTopic::from_message("Analyze my month"), AdviceTopic::SpendingAnalysis);
        assert_eq!(AdviceTopic::from_message("Help me BUDGET"), AdviceTopic::BudgetPlan);
        assert_eq!(AdviceTopic::from_message("I want to save"), AdviceTopic::Savings);
        assert_eq!(AdviceTopic::from_message("cut costs"), AdviceTopic::Reduction);
        assert_eq!(AdviceTopic::from_message("hello"), AdviceTopic::General);
    }

    #[test]
    fn test_topic_priority() {
        // "spending" wins over "budget"
        assert_eq!(
            AdviceTopic::from_message("budget my spending"),
            AdviceTopic::SpendingAnalysis
        );
    }

    #[test]
    fn test_snapshot() {
        let snapshot = SpendingSnapshot::from_request(&request("", sample_expenses(), Some(1000.0)));
        assert_eq!(snapshot.total, 500.0);
        assert_eq!(snapshot.top(), Some(("Food", 300.0)));
        assert_eq!(snapshot.categories.len(), 3);
        assert!((snapshot.savings_rate - 50.0).abs() < 1e-9);
        assert!((snapshot.share_of_total(300.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_tie_break_is_alphabetical() {
        let snapshot = SpendingSnapshot::from_request(&request(
            "",
            vec![expense(50.0, "Zoo"), expense(50.0, "Art")],
            None,
        ));
        assert_eq!(snapshot.top(), Some(("Art", 50.0)));
    }

    #[test]
    fn test_spending_analysis() {
        let advice = generate_advice(&request("analyze", sample_expenses(), Some(1000.0)));
        assert!(advice.starts_with("**SmartSaver Spending Analysis:**"));
        assert!(advice.contains("1. Food: $300.00 (60.0%)"));
        assert!(advice.contains("Great job! You're saving well."));
        assert!(advice.contains("Set a weekly limit of $75 for Food"));
    }

    #[test]
    fn test_budget_plan() {
        let advice = generate_advice(&request("make a plan", sample_expenses(), None));
        assert!(advice.contains("**Needs (50%):** $250.00"));
        assert!(advice.contains("Recommended total: $400.00"));
        assert!(advice.contains("Allocate Food budget to $60/month"));
    }

    #[test]
    fn test_savings_strategy() {
        let advice = generate_advice(&request("savings goal", sample_expenses(), None));
        assert!(advice.contains("Reduce Food by 20% = $60.00/month saved"));
        assert!(advice.contains("Annual impact: $720.00"));
        assert!(advice.contains("Vacation Fund ($3,000): 50 months"));
    }

    #[test]
    fn test_savings_strategy_without_expenses_uses_fallback() {
        let advice = generate_advice(&request("save money", Vec::new(), None));
        assert!(advice.contains("$100.00/month saved"));
        assert!(advice.contains("Investment Goal ($10,000): 100 months"));
    }

    #[test]
    fn test_savings_strategy_zero_spend_has_no_timeline() {
        let advice = generate_advice(&request("save", vec![expense(0.0, "Food")], None));
        assert!(advice.contains("Vacation Fund ($3,000): n/a"));
    }

    #[test]
    fn test_reduction_tips() {
        let advice = generate_advice(&request("reduce", sample_expenses(), None));
        assert!(advice.starts_with("**Food Reduction Tips:**"));
        assert!(advice.contains("Target: $240.00/month"));
        assert!(advice.contains("Monthly savings: $60.00"));
    }

    #[test]
    fn test_general_without_expenses() {
        let advice = generate_advice(&request("hi there", Vec::new(), None));
        assert!(advice.contains("Total tracked expenses: $0.00"));
        assert!(advice.contains("Average per category: $0.00"));
        assert!(!advice.contains("NaN"));
    }

    #[test]
    fn test_analysis_without_expenses() {
        let advice = generate_advice(&request("review", Vec::new(), None));
        assert!(advice.contains("miscellaneous at 0.0%"));
        assert!(advice.contains("Consider increasing your savings rate"));
        assert!(!advice.contains("NaN"));
    }
}
