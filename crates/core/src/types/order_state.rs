//! Order lifecycle state machine.
//!
//! An order starts life as a `basket` (a mutable cart), becomes `placed` at
//! checkout, and then moves through fulfillment states until it is
//! `delivered` or `canceled`. The transition table is explicit: handlers ask
//! the state machine whether a move is legal instead of comparing strings.
//!
//! Inventory coupling: exactly two edges touch stock. `basket -> placed`
//! (checkout) decrements inventory, and any `* -> canceled` edge restores it.
//! Everything else is a pure status change.

use serde::{Deserialize, Serialize};

/// Who is requesting a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The user who owns the order.
    Owner,
    /// A staff user acting through the administrator route.
    Administrator,
}

/// Why a requested transition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The order is in a terminal state.
    #[error("order is already {0} and cannot change state")]
    Terminal(OrderState),

    /// The actor is not allowed to make this transition.
    #[error("only a placed order can be canceled by its owner (current state: {0})")]
    OwnerCannotCancel(OrderState),

    /// The target state is not reachable from the current state.
    #[error("cannot move order from {from} to {to}")]
    NotAllowed {
        /// Current state.
        from: OrderState,
        /// Requested state.
        to: OrderState,
    },
}

/// Lifecycle state of an order.
///
/// Stored as lowercase text in the `customer_order.state` column and on the
/// wire. The original system called the placed state "new"; `placed` is the
/// canonical name here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    /// In-progress cart; mutable, invisible in order listings.
    Basket,
    /// Checked out and awaiting confirmation.
    Placed,
    /// Confirmed by a manager.
    Confirmed,
    /// Picked and packed.
    Assembled,
    /// Handed to the carrier.
    Sent,
    /// Received by the buyer. Terminal.
    Delivered,
    /// Canceled; inventory has been restored. Terminal.
    Canceled,
}

impl OrderState {
    /// All states an administrator may request as a target.
    pub const ADMIN_TARGETS: [Self; 6] = [
        Self::Placed,
        Self::Confirmed,
        Self::Assembled,
        Self::Sent,
        Self::Delivered,
        Self::Canceled,
    ];

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Check whether `actor` may move an order from `self` to `to`.
    ///
    /// Owners may only cancel a `placed` order. Administrators may move an
    /// order from any non-terminal state to any listed target except back to
    /// `basket`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] describing why the move is illegal.
    pub fn check_transition(self, to: Self, actor: Actor) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }

        match actor {
            Actor::Owner => {
                if self == Self::Placed && to == Self::Canceled {
                    Ok(())
                } else {
                    Err(TransitionError::OwnerCannotCancel(self))
                }
            }
            Actor::Administrator => {
                if to == Self::Basket || to == self {
                    Err(TransitionError::NotAllowed { from: self, to })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Whether moving from `self` to `to` must return stock to inventory.
    ///
    /// True exactly on the edge into `canceled` from a non-canceled state.
    /// The state-machine precondition (terminal states never transition)
    /// guarantees this fires at most once per order.
    #[must_use]
    pub const fn restores_inventory(self, to: Self) -> bool {
        matches!(to, Self::Canceled) && !matches!(self, Self::Canceled)
    }

    /// Lowercase wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basket => "basket",
            Self::Placed => "placed",
            Self::Confirmed => "confirmed",
            Self::Assembled => "assembled",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basket" => Ok(Self::Basket),
            "placed" => Ok(Self::Placed),
            "confirmed" => Ok(Self::Confirmed),
            "assembled" => Ok(Self::Assembled),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("invalid order state: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_can_cancel_only_placed() {
        assert!(
            OrderState::Placed
                .check_transition(OrderState::Canceled, Actor::Owner)
                .is_ok()
        );

        for state in [
            OrderState::Basket,
            OrderState::Confirmed,
            OrderState::Assembled,
            OrderState::Sent,
        ] {
            let err = state
                .check_transition(OrderState::Canceled, Actor::Owner)
                .expect_err("owner cancel must be rejected");
            assert_eq!(err, TransitionError::OwnerCannotCancel(state));
        }
    }

    #[test]
    fn owner_cannot_request_other_targets() {
        let err = OrderState::Placed
            .check_transition(OrderState::Delivered, Actor::Owner)
            .expect_err("owner may only cancel");
        assert!(matches!(err, TransitionError::OwnerCannotCancel(_)));
    }

    #[test]
    fn terminal_states_never_transition() {
        for from in [OrderState::Delivered, OrderState::Canceled] {
            for to in OrderState::ADMIN_TARGETS {
                for actor in [Actor::Owner, Actor::Administrator] {
                    let err = from
                        .check_transition(to, actor)
                        .expect_err("terminal state must be frozen");
                    assert!(matches!(
                        err,
                        TransitionError::Terminal(_) | TransitionError::NotAllowed { .. }
                    ));
                }
            }
        }
    }

    #[test]
    fn second_cancel_is_rejected() {
        // The idempotency guard for inventory restoration: once canceled,
        // another cancel request fails before any stock is touched.
        let err = OrderState::Canceled
            .check_transition(OrderState::Canceled, Actor::Administrator)
            .expect_err("already canceled");
        assert_eq!(err, TransitionError::Terminal(OrderState::Canceled));
    }

    #[test]
    fn admin_can_walk_fulfillment_states() {
        let path = [
            OrderState::Placed,
            OrderState::Confirmed,
            OrderState::Assembled,
            OrderState::Sent,
            OrderState::Delivered,
        ];
        for window in path.windows(2) {
            assert!(
                window[0]
                    .check_transition(window[1], Actor::Administrator)
                    .is_ok(),
                "{} -> {} must be legal for admin",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn admin_cannot_move_back_to_basket() {
        let err = OrderState::Placed
            .check_transition(OrderState::Basket, Actor::Administrator)
            .expect_err("basket is not a valid target");
        assert_eq!(
            err,
            TransitionError::NotAllowed {
                from: OrderState::Placed,
                to: OrderState::Basket
            }
        );
    }

    #[test]
    fn restoration_fires_exactly_on_cancel_edge() {
        assert!(OrderState::Placed.restores_inventory(OrderState::Canceled));
        assert!(OrderState::Sent.restores_inventory(OrderState::Canceled));
        assert!(!OrderState::Canceled.restores_inventory(OrderState::Canceled));
        assert!(!OrderState::Placed.restores_inventory(OrderState::Confirmed));
        assert!(!OrderState::Placed.restores_inventory(OrderState::Delivered));
    }

    #[test]
    fn state_round_trips_through_str() {
        for state in [
            OrderState::Basket,
            OrderState::Placed,
            OrderState::Confirmed,
            OrderState::Assembled,
            OrderState::Sent,
            OrderState::Delivered,
            OrderState::Canceled,
        ] {
            let parsed: OrderState = state.as_str().parse().expect("parse");
            assert_eq!(parsed, state);
        }
        assert!("new".parse::<OrderState>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&OrderState::Placed).expect("serialize");
        assert_eq!(json, "\"placed\"");
        let back: OrderState = serde_json::from_str("\"canceled\"").expect("deserialize");
        assert_eq!(back, OrderState::Canceled);
    }
}
