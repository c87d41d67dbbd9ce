//! Service layer: checkout, health probes and the notification dispatcher.

pub mod checkout_service;
pub mod health_service;
pub mod notification_service;
