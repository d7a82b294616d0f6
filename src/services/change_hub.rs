//! Barramento em memória das mudanças de linhas (ponto e caixa).
//!
//! Um único `broadcast` por processo. Cada guard montado segura uma
//! `Subscription` filtrada pelo seu escopo; soltar o handle cancela a assinatura.

use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::{
    common::error::GuardError,
    models::change::{ChangeCollection, ChangeEvent},
};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeScope {
    pub restaurant_id: Uuid,
    /// `None` para donos/admins, que não acompanham o ponto.
    pub employee_id: Option<Uuid>,
}

impl ChangeScope {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        let row = match event {
            ChangeEvent::Resync => return true,
            ChangeEvent::Row(row) => row,
        };
        match row.collection {
            ChangeCollection::CashRegister => row.restaurant_id == self.restaurant_id,
            ChangeCollection::Attendance => {
                self.employee_id.is_some()
                    && row.employee_id == self.employee_id
                    && row.restaurant_id == self.restaurant_id
            }
        }
    }
}

#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }
}

impl ChangeHub {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Devolve quantos assinantes receberam. Sem assinantes não é erro.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, scope: ChangeScope) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            scope,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    scope: ChangeScope,
}

impl Subscription {
    pub fn scope(&self) -> ChangeScope {
        self.scope
    }

    /// Próximo evento do escopo. `None` quando o hub foi encerrado.
    ///
    /// Se o assinante ficou para trás e perdeu eventos, devolve
    /// `SubscriptionFailure`: quem chama deve reler tudo e reassinar.
    pub async fn next(&mut self) -> Option<Result<ChangeEvent, GuardError>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.scope.matches(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    return Some(Err(GuardError::SubscriptionFailure(format!(
                        "{missed} eventos perdidos"
                    ))));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::change::{ChangeOperation, RowChange};

    fn row(collection: ChangeCollection, restaurant_id: Uuid, employee_id: Option<Uuid>) -> ChangeEvent {
        ChangeEvent::Row(RowChange {
            collection,
            operation: ChangeOperation::Insert,
            restaurant_id,
            employee_id,
        })
    }

    #[test]
    fn test_cash_register_scope_is_restaurant() {
        let restaurant_id = Uuid::new_v4();
        let scope = ChangeScope { restaurant_id, employee_id: None };

        assert!(scope.matches(&row(ChangeCollection::CashRegister, restaurant_id, None)));
        assert!(!scope.matches(&row(ChangeCollection::CashRegister, Uuid::new_v4(), None)));
    }

    #[test]
    fn test_attendance_scope_is_employee() {
        let (restaurant_id, employee_id) = (Uuid::new_v4(), Uuid::new_v4());
        let scope = ChangeScope { restaurant_id, employee_id: Some(employee_id) };

        assert!(scope.matches(&row(ChangeCollection::Attendance, restaurant_id, Some(employee_id))));
        assert!(!scope.matches(&row(ChangeCollection::Attendance, restaurant_id, Some(Uuid::new_v4()))));
    }

    #[test]
    fn test_owner_scope_ignores_attendance() {
        let restaurant_id = Uuid::new_v4();
        let scope = ChangeScope { restaurant_id, employee_id: None };

        assert!(!scope.matches(&row(ChangeCollection::Attendance, restaurant_id, None)));
        assert!(scope.matches(&ChangeEvent::Resync));
    }

    #[tokio::test]
    async fn test_subscription_skips_foreign_events() {
        let hub = ChangeHub::default();
        let restaurant_id = Uuid::new_v4();
        let mut subscription = hub.subscribe(ChangeScope { restaurant_id, employee_id: None });

        hub.publish(row(ChangeCollection::CashRegister, Uuid::new_v4(), None));
        hub.publish(row(ChangeCollection::CashRegister, restaurant_id, None));

        let event = subscription.next().await.unwrap().unwrap();
        assert_eq!(event, row(ChangeCollection::CashRegister, restaurant_id, None));
    }

    #[tokio::test]
    async fn test_lag_is_reported_as_subscription_failure() {
        let hub = ChangeHub::with_capacity(2);
        let restaurant_id = Uuid::new_v4();
        let mut subscription = hub.subscribe(ChangeScope { restaurant_id, employee_id: None });

        for _ in 0..5 {
            hub.publish(row(ChangeCollection::CashRegister, restaurant_id, None));
        }

        let result = subscription.next().await.unwrap();
        assert!(matches!(result, Err(GuardError::SubscriptionFailure(_))));
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let hub = ChangeHub::default();
        let subscription = hub.subscribe(ChangeScope { restaurant_id: Uuid::new_v4(), employee_id: None });
        assert_eq!(hub.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(ChangeEvent::Resync), 0);
    }

    #[tokio::test]
    async fn test_closed_hub_ends_subscription() {
        let hub = ChangeHub::default();
        let mut subscription = hub.subscribe(ChangeScope { restaurant_id: Uuid::new_v4(), employee_id: None });
        drop(hub);
        assert!(subscription.next().await.is_none());
    }
}
