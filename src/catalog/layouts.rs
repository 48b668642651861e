use crate::models::LayoutPreset;

pub(super) static BUILTIN_LAYOUTS: &[LayoutPreset] = &[
    LayoutPreset {
        name: "service-desk-overview",
        description: "Headline counters, status and priority breakdowns, latest tickets",
        widgets: &[
            "open_tickets_count",
            "unassigned_tickets",
            "sla_breaches",
            "my_open_tickets",
            "tickets_by_status",
            "tickets_by_priority",
            "recent_tickets",
        ],
    },
    LayoutPreset {
        name: "agent-performance",
        description: "Workload and throughput per agent",
        widgets: &["agent_workload", "tickets_by_agent", "closed_by_agent", "unassigned_tickets"],
    },
    LayoutPreset {
        name: "sla-monitor",
        description: "SLA compliance, breaches and overdue work",
        widgets: &["sla_compliance", "sla_breaches", "overdue_tickets", "tickets_by_priority"],
    },
    LayoutPreset {
        name: "client-health",
        description: "Ticket volume per client and request type",
        widgets: &["tickets_by_client", "tickets_by_type", "open_tickets_count"],
    },
    LayoutPreset {
        name: "executive-summary",
        description: "Compact overview for service managers",
        widgets: &[
            "open_tickets_count",
            "sla_breaches",
            "sla_compliance",
            "tickets_by_status",
            "tickets_by_client",
        ],
    },
];
