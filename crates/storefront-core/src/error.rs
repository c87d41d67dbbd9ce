//! # Error Types
//!
//! Domain errors for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core (this file)                                           │
//! │  ├── ValidationError  - checkout steps 1-6, bad input shape            │
//! │  └── CoreError        - stock / catalog failures, wraps validation     │
//! │                                                                         │
//! │  storefront-db                                                         │
//! │  └── DbError          - database operation failures                    │
//! │                                                                         │
//! │  checkout-api                                                          │
//! │  └── ApiError         - HTTP status + { error } body                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages in this file are shown to shoppers verbatim, so they are written
//! as instructions ("Please select a delivery area"), not diagnostics.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Catalog and stock failures detected while turning a cart into an order.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart line references a product the storefront does not sell.
    ///
    /// ## When This Occurs
    /// - Product was removed from the catalog after it was added to a cart
    /// - Cart was built against another storefront's catalog
    #[error("Product '{name}' is not available. Please clear your cart and add it again.")]
    ProductNotFound { product_id: String, name: String },

    /// Not enough stock to fulfil a line.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: "Panjabi (L, Black)" × 5
    ///      │
    ///      ▼
    /// Variant stock: 3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Panjabi", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Shopper sees: "Only 3 items available for 'Panjabi'"
    /// ```
    #[error("Only {available} items available for '{name}'")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Cart has more distinct lines than allowed.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A cart line was looked up by key and is not in the cart.
    #[error("Item not found in cart: {0}")]
    LineNotFound(String),

    /// Validation failure, surfaced with the inner message unchanged.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation failures.
///
/// The first six checkout steps each map to one variant, so the caller can
/// tell which step rejected the submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Step 1: a required customer field is empty.
    #[error("Please fill in all fields: {field} is required")]
    Required { field: String },

    /// Step 2: no delivery area chosen.
    #[error("Please select a delivery area")]
    DeliveryAreaRequired,

    /// Step 3: nothing to order.
    #[error("Cart is empty")]
    EmptyCart,

    /// Step 4: phone is not a Bangladeshi mobile number.
    #[error("Invalid Bangladeshi phone number")]
    InvalidPhone,

    /// Step 5: address too short to deliver to.
    #[error("Please provide a more detailed address")]
    AddressTooShort { min: usize },

    /// Step 6: order value under the storefront minimum.
    #[error("Minimum order value is {minimum}")]
    BelowMinimumOrder { minimum: Money },

    /// Step 6: fewer items than the storefront sells per order.
    #[error("Minimum order quantity is {minimum} items")]
    BelowMinimumQuantity { minimum: i64 },

    /// Step 3: more lines than one order may carry.
    #[error("Cart cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g. a non-finite price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
