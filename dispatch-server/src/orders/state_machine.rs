//! Order lifecycle transitions
//!
//! [`check_transition`] is total over every `(from, to)` pair; [`transition_patch`]
//! builds the column patch a permitted transition writes.
//!
//! | Target | Allowed from |
//! |--------|--------------|
//! | any | never from `delivered` / `cancelled` |
//! | `picked_up` | `assigned`, `ready`, `confirmed` |
//! | `delivered` | `picked_up`, `en_route`, code verification only |
//! | `cancelled` | any non-terminal |
//! | other | any non-terminal |

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::order::{Order, OrderStatus};
use thiserror::Error;

use crate::db::Row;

/// How a transition was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    /// `PATCH /orders/{id}/status` and internal moves (assign, cancel)
    StatusUpdate,
    /// Successful delivery code check
    DeliveryVerification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid transition to '{to}' from '{from}'")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::with_message(ErrorCode::InvalidTransition, e.to_string())
            .with_detail("from", e.from.as_str())
            .with_detail("to", e.to.as_str())
    }
}

/// Decide whether `from → to` is permitted
pub fn check_transition(
    from: OrderStatus,
    to: OrderStatus,
    source: TransitionSource,
) -> Result<(), TransitionError> {
    use OrderStatus::*;

    let allowed = !from.is_terminal()
        && match to {
            PickedUp => matches!(from, Assigned | Ready | Confirmed),
            Delivered => {
                source == TransitionSource::DeliveryVerification && from.is_out_for_delivery()
            }
            _ => true,
        };

    if allowed {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

/// Source of customer delivery codes
pub trait DeliveryCodes: Send + Sync {
    fn issue(&self) -> String;
}

/// Uniform random 6-digit codes
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl DeliveryCodes for RandomCodes {
    fn issue(&self) -> String {
        rand::thread_rng().gen_range(100_000..1_000_000).to_string()
    }
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339())
}

/// Columns written when `order` moves to `to` at `now`
pub fn transition_patch(
    order: &Order,
    to: OrderStatus,
    now: DateTime<Utc>,
    codes: &dyn DeliveryCodes,
) -> Row {
    let mut patch = Row::new();
    patch.insert("status".into(), json!(to.as_str()));
    patch.insert("updated_at".into(), timestamp(now));

    match to {
        OrderStatus::PickedUp => {
            patch.insert("actual_pickup_time".into(), timestamp(now));
            if order.delivery_code.is_none() {
                patch.insert("delivery_code".into(), json!(codes.issue()));
                patch.insert("delivery_code_used".into(), json!(false));
            }
        }
        OrderStatus::Delivered => {
            patch.insert("actual_delivery_time".into(), timestamp(now));
            patch.insert("delivery_code_used".into(), json!(true));
        }
        _ => {}
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;
    use TransitionSource::*;

    struct FixedCode(&'static str);

    impl DeliveryCodes for FixedCode {
        fn issue(&self) -> String {
            self.0.to_string()
        }
    }

    fn order(status: OrderStatus, code: Option<&str>) -> Order {
        let mut row = Row::new();
        row.insert("order_id".into(), json!("o-1"));
        row.insert("status".into(), json!(status.as_str()));
        if let Some(code) = code {
            row.insert("delivery_code".into(), json!(code));
        }
        Order::from_row(&row).unwrap()
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for from in [Delivered, Cancelled] {
            for to in OrderStatus::ALL {
                for source in [StatusUpdate, DeliveryVerification] {
                    assert_eq!(
                        check_transition(from, to, source),
                        Err(TransitionError { from, to })
                    );
                }
            }
        }
    }

    #[test]
    fn test_pickup_sources() {
        for from in OrderStatus::ALL {
            let expected = matches!(from, Assigned | Ready | Confirmed);
            assert_eq!(
                check_transition(from, PickedUp, StatusUpdate).is_ok(),
                expected,
                "{from} -> picked_up"
            );
        }
    }

    #[test]
    fn test_delivered_only_through_verification() {
        for from in OrderStatus::ALL {
            assert!(check_transition(from, Delivered, StatusUpdate).is_err());
        }
        assert!(check_transition(PickedUp, Delivered, DeliveryVerification).is_ok());
        assert!(check_transition(EnRoute, Delivered, DeliveryVerification).is_ok());
        assert!(check_transition(Assigned, Delivered, DeliveryVerification).is_err());
    }

    #[test]
    fn test_cancel_and_free_moves_from_non_terminal() {
        for from in OrderStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(check_transition(from, Cancelled, StatusUpdate).is_ok());
            assert!(check_transition(from, Preparing, StatusUpdate).is_ok());
            assert!(check_transition(from, EnRoute, StatusUpdate).is_ok());
        }
    }

    #[test]
    fn test_error_message_and_code() {
        let err = check_transition(Pending, PickedUp, StatusUpdate).unwrap_err();
        assert_eq!(err.to_string(), "Invalid transition to 'picked_up' from 'pending'");

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InvalidTransition);
        assert_eq!(app.http_status().as_u16(), 400);
    }

    #[test]
    fn test_pickup_issues_code_once() {
        let now = Utc::now();
        let patch = transition_patch(&order(Assigned, None), PickedUp, now, &FixedCode("123456"));
        assert_eq!(patch["status"], "picked_up");
        assert_eq!(patch["delivery_code"], "123456");
        assert_eq!(patch["delivery_code_used"], false);
        assert_eq!(patch["actual_pickup_time"], json!(now.to_rfc3339()));
        assert_eq!(patch["updated_at"], json!(now.to_rfc3339()));

        let patch =
            transition_patch(&order(Ready, Some("654321")), PickedUp, now, &FixedCode("123456"));
        assert!(!patch.contains_key("delivery_code"));
        assert!(!patch.contains_key("delivery_code_used"));
    }

    #[test]
    fn test_delivered_marks_code_used() {
        let now = Utc::now();
        let patch = transition_patch(&order(EnRoute, Some("1")), Delivered, now, &RandomCodes);
        assert_eq!(patch["delivery_code_used"], true);
        assert!(patch.contains_key("actual_delivery_time"));
    }

    #[test]
    fn test_other_targets_only_stamp_updated_at() {
        let patch = transition_patch(&order(Pending, None), Confirmed, Utc::now(), &RandomCodes);
        assert_eq!(patch.len(), 2);
    }

    #[test]
    fn test_random_codes_are_six_digits() {
        for _ in 0..200 {
            let code = RandomCodes.issue();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }
}
