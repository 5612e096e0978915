//! Message content for each notification the engine emits.

use chrono::{DateTime, Utc};

use libris_core::types::{MessageKind, Notification};
use libris_entity::{Loan, LoanDetails};

/// Builds the title and body of every circulation message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationRules;

fn date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

impl NotificationRules {
    /// Sent when a loan is issued.
    pub fn loan_created(loan: &Loan, title: &str, inventory_code: &str) -> Notification {
        Notification {
            user_id: loan.user_id,
            kind: MessageKind::LoanCreated,
            title: "Loan created".to_string(),
            body: format!(
                "Loaned: {title} (copy {inventory_code}). Due date: {}.",
                date(loan.due_at)
            ),
        }
    }

    /// Sent `days` before an outstanding loan is due.
    pub fn due_soon(details: &LoanDetails, days: u32) -> Notification {
        Notification {
            user_id: details.loan.user_id,
            kind: MessageKind::DueSoon,
            title: "Return date approaching".to_string(),
            body: format!(
                "Reminder: {title} is due in {days} days ({}).",
                date(details.loan.due_at),
                title = details.title
            ),
        }
    }

    /// Sent once an outstanding loan is past its due date.
    pub fn overdue(details: &LoanDetails) -> Notification {
        Notification {
            user_id: details.loan.user_id,
            kind: MessageKind::Overdue,
            title: "Return date passed".to_string(),
            body: format!(
                "{} (copy {}) was due on {}. Please return it as soon as possible.",
                details.title,
                details.inventory_code,
                date(details.loan.due_at)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use libris_core::types::{CopyId, LoanId, ReservationId, UserId};

    fn loan() -> Loan {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap();
        Loan {
            id: LoanId(5),
            reservation_id: ReservationId(4),
            copy_id: CopyId(3),
            user_id: UserId(2),
            loaned_at: at,
            due_at: Utc.with_ymd_and_hms(2025, 1, 31, 10, 30, 0).unwrap(),
            returned_at: None,
        }
    }

    #[test]
    fn test_loan_created_names_title_code_and_due_date() {
        let n = NotificationRules::loan_created(&loan(), "Solaris", "LIB-2025-000003");
        assert_eq!(n.kind, MessageKind::LoanCreated);
        assert_eq!(n.user_id, UserId(2));
        assert!(n.body.contains("Solaris"));
        assert!(n.body.contains("LIB-2025-000003"));
        assert!(n.body.contains("2025-01-31"));
    }

    #[test]
    fn test_overdue_message() {
        let details = LoanDetails {
            loan: loan(),
            title: "Solaris".to_string(),
            inventory_code: "LIB-2025-000003".to_string(),
        };
        let n = NotificationRules::overdue(&details);
        assert_eq!(n.kind, MessageKind::Overdue);
        assert!(n.body.contains("was due on 2025-01-31"));
    }
}
