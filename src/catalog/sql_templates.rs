use crate::models::ValidatedTemplate;

// Query texts below are restricted to the dialect subset shared by the PSA
// reporting endpoint (SQL Server) and the local SQLite executor.

pub const OPEN_TICKET_COUNT_SQL: &str =
    "SELECT COUNT(*) AS Total FROM Faults WHERE Status <> 9 AND FDeleted = 0";

pub const UNASSIGNED_TICKET_COUNT_SQL: &str =
    "SELECT COUNT(*) AS Total FROM Faults WHERE Status <> 9 AND FDeleted = 0 AND Assignedtoint = 0";

pub const SLA_BREACH_COUNT_SQL: &str =
    "SELECT COUNT(*) AS Total FROM Faults WHERE Status <> 9 AND FDeleted = 0 AND SLAState = 'O'";

pub const TICKETS_BY_STATUS_SQL: &str = "SELECT s.tstatusdesc AS Status, COUNT(f.Faultid) AS Tickets \
FROM Faults f JOIN TStatus s ON s.Tstatus = f.Status \
WHERE f.FDeleted = 0 GROUP BY s.tstatusdesc ORDER BY Tickets DESC";

pub const TICKETS_BY_PRIORITY_SQL: &str = "SELECT p.pdesc AS Priority, COUNT(f.Faultid) AS Tickets \
FROM Faults f JOIN Priority p ON p.PriorityId = f.Seriousness \
WHERE f.Status <> 9 AND f.FDeleted = 0 GROUP BY p.pdesc ORDER BY Tickets DESC";

pub const TICKETS_BY_AGENT_SQL: &str = "SELECT u.uname AS Agent, COUNT(f.Faultid) AS Tickets \
FROM Faults f JOIN Uname u ON u.Unum = f.Assignedtoint \
WHERE f.FDeleted = 0 GROUP BY u.uname ORDER BY Tickets DESC";

pub const AGENT_WORKLOAD_SQL: &str = "SELECT u.uname AS Agent, COUNT(f.Faultid) AS OpenTickets \
FROM Faults f JOIN Uname u ON u.Unum = f.Assignedtoint \
WHERE f.Status <> 9 AND f.FDeleted = 0 GROUP BY u.uname ORDER BY OpenTickets DESC";

pub const CLOSED_BY_AGENT_SQL: &str = "SELECT u.uname AS Agent, COUNT(f.Faultid) AS Closed \
FROM Faults f JOIN Uname u ON u.Unum = f.Assignedtoint \
WHERE f.Status = 9 AND f.FDeleted = 0 GROUP BY u.uname ORDER BY Closed DESC";

pub const TICKETS_BY_CLIENT_SQL: &str = "SELECT a.aareadesc AS Client, COUNT(f.Faultid) AS Tickets \
FROM Faults f JOIN Area a ON a.Aarea = f.Areaint \
WHERE f.Status <> 9 AND f.FDeleted = 0 GROUP BY a.aareadesc ORDER BY Tickets DESC";

pub const TICKETS_BY_TEAM_SQL: &str = "SELECT f.Sectio_ AS Team, COUNT(f.Faultid) AS Tickets \
FROM Faults f WHERE f.Status <> 9 AND f.FDeleted = 0 GROUP BY f.Sectio_ ORDER BY Tickets DESC";

pub const TICKETS_BY_TYPE_SQL: &str = "SELECT r.rtdesc AS TicketType, COUNT(f.Faultid) AS Tickets \
FROM Faults f JOIN RequestType r ON r.RTid = f.RequestTypeNew \
WHERE f.FDeleted = 0 GROUP BY r.rtdesc ORDER BY Tickets DESC";

pub const SLA_COMPLIANCE_SQL: &str = "SELECT CASE WHEN f.SLAState = 'O' THEN 'Breached' ELSE 'Within SLA' END AS SlaStatus, \
COUNT(f.Faultid) AS Tickets FROM Faults f WHERE f.FDeleted = 0 \
GROUP BY CASE WHEN f.SLAState = 'O' THEN 'Breached' ELSE 'Within SLA' END";

static VALIDATED_TEMPLATES: &[ValidatedTemplate] = &[
    ValidatedTemplate {
        key: "open_ticket_count",
        name: "Open Ticket Count",
        description: "Number of tickets that are not closed",
        category: "Tickets",
        chart_type: None,
        sql: OPEN_TICKET_COUNT_SQL,
    },
    ValidatedTemplate {
        key: "unassigned_ticket_count",
        name: "Unassigned Ticket Count",
        description: "Open tickets with no assigned agent",
        category: "Tickets",
        chart_type: None,
        sql: UNASSIGNED_TICKET_COUNT_SQL,
    },
    ValidatedTemplate {
        key: "sla_breach_count",
        name: "SLA Breach Count",
        description: "Open tickets currently outside their SLA",
        category: "SLA",
        chart_type: None,
        sql: SLA_BREACH_COUNT_SQL,
    },
    ValidatedTemplate {
        key: "tickets_by_status",
        name: "Tickets by Status",
        description: "Ticket volume grouped by status",
        category: "Tickets",
        chart_type: Some("bar"),
        sql: TICKETS_BY_STATUS_SQL,
    },
    ValidatedTemplate {
        key: "tickets_by_priority",
        name: "Tickets by Priority",
        description: "Open ticket volume grouped by priority",
        category: "Tickets",
        chart_type: Some("pie"),
        sql: TICKETS_BY_PRIORITY_SQL,
    },
    ValidatedTemplate {
        key: "tickets_by_agent",
        name: "Tickets by Agent",
        description: "All tickets grouped by assigned agent",
        category: "Agents",
        chart_type: Some("bar"),
        sql: TICKETS_BY_AGENT_SQL,
    },
    ValidatedTemplate {
        key: "agent_workload",
        name: "Agent Workload",
        description: "Open tickets per assigned agent",
        category: "Agents",
        chart_type: Some("bar"),
        sql: AGENT_WORKLOAD_SQL,
    },
    ValidatedTemplate {
        key: "closed_by_agent",
        name: "Closed Tickets by Agent",
        description: "Closed ticket volume per agent",
        category: "Agents",
        chart_type: Some("bar"),
        sql: CLOSED_BY_AGENT_SQL,
    },
    ValidatedTemplate {
        key: "tickets_by_client",
        name: "Tickets by Client",
        description: "Open ticket volume per client",
        category: "Clients",
        chart_type: Some("bar"),
        sql: TICKETS_BY_CLIENT_SQL,
    },
    ValidatedTemplate {
        key: "tickets_by_team",
        name: "Tickets by Team",
        description: "Open ticket volume per support team",
        category: "Tickets",
        chart_type: Some("bar"),
        sql: TICKETS_BY_TEAM_SQL,
    },
    ValidatedTemplate {
        key: "tickets_by_type",
        name: "Tickets by Type",
        description: "Ticket volume per request type",
        category: "Tickets",
        chart_type: Some("pie"),
        sql: TICKETS_BY_TYPE_SQL,
    },
    ValidatedTemplate {
        key: "sla_compliance",
        name: "SLA Compliance",
        description: "Tickets inside versus outside their SLA",
        category: "SLA",
        chart_type: Some("pie"),
        sql: SLA_COMPLIANCE_SQL,
    },
];

pub fn validated_templates() -> &'static [ValidatedTemplate] {
    VALIDATED_TEMPLATES
}

pub fn validated_template(key: &str) -> Option<&'static ValidatedTemplate> {
    let key = key.trim();
    VALIDATED_TEMPLATES
        .iter()
        .find(|template| template.key.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::{validated_template, validated_templates};
    use std::collections::HashSet;

    #[test]
    fn keys_are_unique() {
        let keys: HashSet<_> = validated_templates().iter().map(|t| t.key).collect();
        assert_eq!(keys.len(), validated_templates().len());
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let template = validated_template("  SLA_Compliance ").expect("template");
        assert_eq!(template.key, "sla_compliance");
        assert!(validated_template("missing").is_none());
    }

    #[test]
    fn every_template_runs_against_the_fixture_schema() {
        let harness = crate::test_support::harness();
        for template in validated_templates() {
            let result = harness
                .executor
                .run_sql(template.sql, &Default::default())
                .unwrap_or_else(|error| panic!("{} failed: {}", template.key, error));
            assert!(!result.columns.is_empty(), "{}", template.key);
        }
    }
}
