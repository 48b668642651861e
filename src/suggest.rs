/// Keyword to widget archetype mapping used for free-text suggestions.
static KEYWORD_WIDGETS: &[(&str, &[&str])] = &[
    ("open", &["open_tickets_count"]),
    ("backlog", &["open_tickets_count", "unassigned_tickets", "tickets_by_status"]),
    ("unassigned", &["unassigned_tickets"]),
    ("status", &["tickets_by_status"]),
    ("priority", &["tickets_by_priority"]),
    ("urgent", &["tickets_by_priority", "sla_breaches"]),
    ("team", &["tickets_by_team"]),
    ("type", &["tickets_by_type"]),
    ("category", &["tickets_by_type"]),
    ("agent", &["agent_workload", "tickets_by_agent", "closed_by_agent"]),
    ("technician", &["agent_workload", "tickets_by_agent", "closed_by_agent"]),
    ("workload", &["agent_workload", "unassigned_tickets"]),
    ("performance", &["agent_workload", "sla_compliance", "closed_by_agent"]),
    ("closed", &["closed_by_agent"]),
    ("resolved", &["closed_by_agent"]),
    ("client", &["tickets_by_client"]),
    ("customer", &["tickets_by_client"]),
    ("sla", &["sla_compliance", "sla_breaches"]),
    ("breach", &["sla_breaches"]),
    ("overdue", &["overdue_tickets", "sla_breaches"]),
    ("recent", &["recent_tickets"]),
    ("latest", &["recent_tickets"]),
    ("my tickets", &["my_open_tickets"]),
    ("overview", &["open_tickets_count", "tickets_by_status", "tickets_by_priority"]),
    ("executive", &["open_tickets_count", "sla_compliance", "tickets_by_status"]),
];

const DEFAULT_SUGGESTIONS: &[&str] = &["open_tickets_count", "tickets_by_status", "tickets_by_priority"];

/// Ranks archetype ids by how many keywords in `description` point at them.
pub fn suggest_widgets(description: &str, limit: usize) -> Vec<&'static str> {
    let text = description.to_lowercase();
    let mut scores: Vec<(&'static str, u32)> = Vec::new();

    for (keyword, widgets) in KEYWORD_WIDGETS {
        if !text.contains(keyword) {
            continue;
        }
        for widget in widgets.iter().copied() {
            match scores.iter_mut().find(|(id, _)| *id == widget) {
                Some((_, score)) => *score += 1,
                None => scores.push((widget, 1)),
            }
        }
    }

    if scores.is_empty() {
        return DEFAULT_SUGGESTIONS.iter().copied().take(limit).collect();
    }

    // Stable: equal scores keep first-seen order.
    scores.sort_by(|left, right| right.1.cmp(&left.1));
    scores.into_iter().take(limit).map(|(id, _)| id).collect()
}
