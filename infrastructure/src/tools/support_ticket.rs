//! Support tickets: ticket lookup, incident checks and ticket creation
//!
//! Created tickets are computed from the request and never stored, so a
//! shared instance answers every unit identically.

use super::simulated::{SimulatedTool, ToolDataError, bool_param, string_param};
use bizeval_domain::core::string::fnv1a64;
use bizeval_domain::{ToolDefinition, ToolError, ToolErrorKind, ToolOutcome, ToolParameter};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub const SUPPORT_TICKET: &str = "support_ticket";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const SEVERITIES: [&str; 4] = ["low", "medium", "high", "critical"];
const ESCALATION_SUFFIX: &str = " (Escalated to Senior Engineering)";
const WORKAROUND_LEAD_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Ticket {
    ticket_id: String,
    issue_type: String,
    severity: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Incident {
    incident_id: String,
    issue_type: String,
    affected_customers: Vec<String>,
    #[serde(flatten)]
    details: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct Routing<T> {
    by_component: BTreeMap<String, T>,
    by_issue_type: BTreeMap<String, T>,
    default: T,
}

impl<T> Routing<T> {
    /// Component wins over issue type; anything else falls to the default.
    fn pick(&self, component: &str, issue_type: &str) -> &T {
        self.by_component
            .get(component)
            .or_else(|| self.by_issue_type.get(issue_type))
            .unwrap_or(&self.default)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TicketData {
    tickets: BTreeMap<String, Vec<Ticket>>,
    incidents: Vec<Incident>,
    teams: Routing<String>,
    workarounds: Routing<Value>,
    resolution_hours: BTreeMap<String, i64>,
}

/// Get the tool definition for support_ticket
pub fn support_ticket_definition() -> ToolDefinition {
    ToolDefinition::new(
        SUPPORT_TICKET,
        "Check existing support tickets and active incidents, or create new support tickets",
    )
    .with_parameter(
        ToolParameter::new(
            "check_organization",
            "Organization name to check for existing tickets",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "issue_type",
            "Type of issue (e.g., 'authentication', 'performance', 'data', 'integration')",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "severity",
            "Issue severity ('low', 'medium', 'high', 'critical')",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("ticket_id", "Specific ticket ID to check", false).with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("create_ticket", "Whether to create a new ticket", false)
            .with_type("boolean"),
    )
    .with_parameter(
        ToolParameter::new("customer_name", "Customer name for the new ticket", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("issue_description", "Description of the issue", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "component",
            "System component with the issue (e.g., 'inventory_api', 'identity_service')",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "environment",
            "Environment (production, staging, development)",
            false,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("version", "Software version with the issue", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("workaround_requested", "Whether a workaround is requested", false)
            .with_type("boolean"),
    )
}

fn timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub struct SupportTicket {
    data: TicketData,
    /// Creation time stamped on new tickets
    opened_at: NaiveDateTime,
}

impl SupportTicket {
    pub fn new(today: NaiveDate) -> Result<Self, ToolDataError> {
        let data = serde_json::from_str(include_str!("data/support_tickets.json"))
            .map_err(|e| ToolDataError::new(SUPPORT_TICKET, e))?;
        let opened_at = today.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default());
        Ok(Self { data, opened_at })
    }

    fn lookup(&self, ticket_id: &str) -> Value {
        let ticket = self.data.tickets.iter().find_map(|(org, tickets)| {
            tickets
                .iter()
                .find(|t| t.ticket_id.eq_ignore_ascii_case(ticket_id))
                .map(|t| (org, t))
        });
        if let Some((org, ticket)) = ticket {
            return json!({"found": true, "organization": org, "ticket": ticket});
        }
        match self
            .data
            .incidents
            .iter()
            .find(|i| i.incident_id.eq_ignore_ascii_case(ticket_id))
        {
            Some(incident) => json!({"found": true, "is_global_incident": true, "incident": incident}),
            None => json!({
                "found": false,
                "message": format!("No ticket found with ID {}", ticket_id),
            }),
        }
    }

    fn check_organization(
        &self,
        organization: &str,
        issue_type: Option<&str>,
        severity: Option<&str>,
    ) -> Value {
        let type_matches = |t: &str| issue_type.is_none_or(|want| t.eq_ignore_ascii_case(want));

        let incidents: Vec<&Incident> = self
            .data
            .incidents
            .iter()
            .filter(|i| {
                i.affected_customers
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(organization))
            })
            .filter(|i| type_matches(i.issue_type.as_str()))
            .collect();
        if !incidents.is_empty() {
            return json!({
                "organization": organization,
                "message": format!(
                    "Found {} active incidents that may affect your organization",
                    incidents.len()
                ),
                "matching_incidents": incidents,
            });
        }

        let Some(tickets) = self
            .data
            .tickets
            .iter()
            .find(|(org, _)| org.eq_ignore_ascii_case(organization))
            .map(|(_, tickets)| tickets)
        else {
            return json!({
                "found": false,
                "organization": organization,
                "message": "No tickets found for this organization",
            });
        };
        let tickets: Vec<&Ticket> = tickets
            .iter()
            .filter(|t| type_matches(t.issue_type.as_str()))
            .filter(|t| severity.is_none_or(|s| t.severity.eq_ignore_ascii_case(s)))
            .collect();
        json!({
            "found": !tickets.is_empty(),
            "organization": organization,
            "count": tickets.len(),
            "tickets": tickets,
        })
    }

    fn create(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let required = |key: &str| {
            string_param(parameters, key).ok_or_else(|| {
                ToolError::new(
                    ToolErrorKind::InvalidParameters,
                    format!("{} is required to create a ticket", key),
                )
            })
        };
        let customer = required("customer_name")?;
        let description = required("issue_description")?;
        let severity = string_param(parameters, "severity")
            .unwrap_or("medium")
            .to_lowercase();
        if !SEVERITIES.contains(&severity.as_str()) {
            return Err(ToolError::new(
                ToolErrorKind::InvalidParameters,
                format!(
                    "Unknown severity '{}'; expected one of {}",
                    severity,
                    SEVERITIES.join(", ")
                ),
            ));
        }
        let issue_type = string_param(parameters, "issue_type")
            .unwrap_or("general")
            .to_lowercase();
        let component = string_param(parameters, "component").unwrap_or("Unknown");

        let key = format!("{}|{}|{}", customer, description, severity);
        let ticket_id = format!("INC-{}", 10_000 + fnv1a64(key.as_bytes()) % 90_000);
        let mut team = self.data.teams.pick(component, &issue_type).clone();
        if severity == "critical" {
            team.push_str(ESCALATION_SUFFIX);
        }
        let hours = self
            .data
            .resolution_hours
            .get(&severity)
            .copied()
            .unwrap_or(24);

        let mut ticket = json!({
            "ticket_id": ticket_id,
            "created_at": timestamp(self.opened_at),
            "status": "Open",
            "issue_type": issue_type,
            "severity": severity,
            "description": description,
            "environment": string_param(parameters, "environment").unwrap_or("Production"),
            "component": component,
            "version": string_param(parameters, "version").unwrap_or("Unknown"),
            "assigned_to": team,
            "resolution_eta": timestamp(self.opened_at + TimeDelta::hours(hours)),
            "updates": [],
        });
        if bool_param(parameters, "workaround_requested") {
            let mut workaround = self.data.workarounds.pick(component, &issue_type).clone();
            workaround["available_from"] = json!(timestamp(
                self.opened_at + TimeDelta::minutes(WORKAROUND_LEAD_MINUTES)
            ));
            ticket["workaround"] = workaround;
        }

        Ok(json!({
            "success": true,
            "ticket_id": ticket_id,
            "message": format!("Ticket {} created successfully", ticket_id),
            "ticket": ticket,
        }))
    }
}

impl SimulatedTool for SupportTicket {
    fn definition(&self) -> ToolDefinition {
        support_ticket_definition()
    }

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        if let Some(ticket_id) = string_param(parameters, "ticket_id") {
            return Ok(self.lookup(ticket_id));
        }
        if let Some(organization) = string_param(parameters, "check_organization") {
            return Ok(self.check_organization(
                organization,
                string_param(parameters, "issue_type"),
                string_param(parameters, "severity"),
            ));
        }
        if bool_param(parameters, "create_ticket") {
            return self.create(parameters);
        }
        Err(ToolError::new(
            ToolErrorKind::InvalidParameters,
            "Specify check_organization, ticket_id, or create_ticket=true",
        ))
    }
}
