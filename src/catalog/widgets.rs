use super::sql_templates::{
    AGENT_WORKLOAD_SQL, CLOSED_BY_AGENT_SQL, OPEN_TICKET_COUNT_SQL, SLA_BREACH_COUNT_SQL, SLA_COMPLIANCE_SQL,
    TICKETS_BY_AGENT_SQL, TICKETS_BY_CLIENT_SQL, TICKETS_BY_PRIORITY_SQL, TICKETS_BY_STATUS_SQL,
    TICKETS_BY_TEAM_SQL, TICKETS_BY_TYPE_SQL, UNASSIGNED_TICKET_COUNT_SQL,
};
use crate::models::{WidgetArchetype, WidgetKind};

pub(super) static BUILTIN_ARCHETYPES: &[WidgetArchetype] = &[
    WidgetArchetype {
        id: "open_tickets_count",
        name: "Open Tickets",
        description: "Counter of all tickets that are not closed",
        kind: WidgetKind::CounterFromQuery,
        keywords: &["open tickets", "open ticket count"],
        fallback_sql: Some(OPEN_TICKET_COUNT_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#2563eb",
        width: 3,
        height: 2,
    },
    WidgetArchetype {
        id: "unassigned_tickets",
        name: "Unassigned Tickets",
        description: "Counter of open tickets with no agent",
        kind: WidgetKind::CounterFromQuery,
        keywords: &["unassigned"],
        fallback_sql: Some(UNASSIGNED_TICKET_COUNT_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#f59e0b",
        width: 3,
        height: 2,
    },
    WidgetArchetype {
        id: "sla_breaches",
        name: "SLA Breaches",
        description: "Counter of open tickets outside their SLA",
        kind: WidgetKind::CounterFromQuery,
        keywords: &["sla breach", "breached"],
        fallback_sql: Some(SLA_BREACH_COUNT_SQL),
        reserved_report_name: Some("[auto] SLA Breaches"),
        filter_id: None,
        area_id: None,
        color: "#dc2626",
        width: 3,
        height: 2,
    },
    WidgetArchetype {
        id: "my_open_tickets",
        name: "My Open Tickets",
        description: "Counter driven by the agent's open-ticket filter",
        kind: WidgetKind::CounterFromFilter,
        keywords: &[],
        fallback_sql: None,
        reserved_report_name: None,
        filter_id: Some(1),
        area_id: Some(1),
        color: "#16a34a",
        width: 3,
        height: 2,
    },
    WidgetArchetype {
        id: "tickets_by_status",
        name: "Tickets by Status",
        description: "Bar chart of ticket volume per status",
        kind: WidgetKind::ChartBar,
        keywords: &["status"],
        fallback_sql: Some(TICKETS_BY_STATUS_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#2563eb",
        width: 6,
        height: 4,
    },
    WidgetArchetype {
        id: "tickets_by_priority",
        name: "Tickets by Priority",
        description: "Pie chart of open tickets per priority",
        kind: WidgetKind::ChartPie,
        keywords: &["priority"],
        fallback_sql: Some(TICKETS_BY_PRIORITY_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#7c3aed",
        width: 4,
        height: 4,
    },
    WidgetArchetype {
        id: "tickets_by_team",
        name: "Tickets by Team",
        description: "Bar chart of open tickets per support team",
        kind: WidgetKind::ChartBar,
        keywords: &["team"],
        fallback_sql: Some(TICKETS_BY_TEAM_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#0891b2",
        width: 4,
        height: 4,
    },
    WidgetArchetype {
        id: "tickets_by_type",
        name: "Tickets by Type",
        description: "Pie chart of tickets per request type",
        kind: WidgetKind::ChartPie,
        keywords: &["ticket type", "request type"],
        fallback_sql: Some(TICKETS_BY_TYPE_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#db2777",
        width: 4,
        height: 4,
    },
    WidgetArchetype {
        id: "agent_workload",
        name: "Agent Workload",
        description: "Bar chart of open tickets per agent",
        kind: WidgetKind::ChartBar,
        keywords: &["workload", "agent"],
        fallback_sql: Some(AGENT_WORKLOAD_SQL),
        reserved_report_name: Some("[auto] Agent Workload"),
        filter_id: None,
        area_id: None,
        color: "#ea580c",
        width: 6,
        height: 4,
    },
    WidgetArchetype {
        id: "tickets_by_agent",
        name: "Tickets by Agent",
        description: "Bar chart of all tickets per assigned agent",
        kind: WidgetKind::ChartBar,
        keywords: &["agent", "technician"],
        fallback_sql: Some(TICKETS_BY_AGENT_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#ca8a04",
        width: 6,
        height: 4,
    },
    WidgetArchetype {
        id: "closed_by_agent",
        name: "Closed by Agent",
        description: "Bar chart of closed tickets per agent",
        kind: WidgetKind::ChartBar,
        keywords: &["closed", "resolved"],
        fallback_sql: Some(CLOSED_BY_AGENT_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#65a30d",
        width: 6,
        height: 4,
    },
    WidgetArchetype {
        id: "tickets_by_client",
        name: "Tickets by Client",
        description: "Bar chart of open tickets per client",
        kind: WidgetKind::ChartBar,
        keywords: &["client", "customer"],
        fallback_sql: Some(TICKETS_BY_CLIENT_SQL),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#0d9488",
        width: 6,
        height: 4,
    },
    WidgetArchetype {
        id: "sla_compliance",
        name: "SLA Compliance",
        description: "Pie chart of tickets inside versus outside SLA",
        kind: WidgetKind::ChartPie,
        keywords: &["sla", "compliance"],
        fallback_sql: Some(SLA_COMPLIANCE_SQL),
        reserved_report_name: Some("[auto] SLA Compliance"),
        filter_id: None,
        area_id: None,
        color: "#16a34a",
        width: 4,
        height: 4,
    },
    WidgetArchetype {
        id: "recent_tickets",
        name: "Recent Tickets",
        description: "List of the most recently logged tickets",
        kind: WidgetKind::List,
        keywords: &[],
        fallback_sql: None,
        reserved_report_name: None,
        filter_id: Some(2),
        area_id: Some(1),
        color: "#475569",
        width: 12,
        height: 5,
    },
    WidgetArchetype {
        id: "overdue_tickets",
        name: "Overdue Tickets",
        description: "List of tickets past their fix-by date",
        kind: WidgetKind::List,
        keywords: &[],
        fallback_sql: None,
        reserved_report_name: None,
        filter_id: Some(3),
        area_id: Some(1),
        color: "#b91c1c",
        width: 8,
        height: 5,
    },
];
