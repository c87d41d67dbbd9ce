//! # Checkout Validation
//!
//! The pure steps of the checkout gate. Storage-backed steps (rate limits,
//! pending-order cap) live in the API's checkout service and run after
//! these.
//!
//! ## Step Order (first failure wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      validate_checkout()                                │
//! │                                                                         │
//! │  1. name, phone, address non-empty ──────► Required { field }          │
//! │  2. delivery area chosen ────────────────► DeliveryAreaRequired        │
//! │  3. cart non-empty, ≤ 100 lines, sane ──► EmptyCart / TooManyItems    │
//! │  4. Bangladeshi mobile number ───────────► InvalidPhone                │
//! │  5. address ≥ min characters ────────────► AddressTooShort            │
//! │  6. minimum order value / quantity ──────► BelowMinimum*              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ValidatedCheckout { phone (normalised), area, pricing }                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::normalize_bd_phone;
//!
//! assert_eq!(normalize_bd_phone("+880 1712-345678").as_deref(), Some("01712345678"));
//! assert_eq!(normalize_bd_phone("01212345678"), None); // no such operator
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{PricingPolicy, PricingResult};
use crate::types::{CustomerDetails, DeliveryArea, LineItem};
use crate::{DEFAULT_MIN_ADDRESS_LENGTH, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE_TAKA};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Checkout Rules
// =============================================================================

/// Per-storefront thresholds used by steps 5 and 6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRules {
    /// Minimum address length in characters.
    pub min_address_length: usize,
    /// Minimum discounted subtotal (delivery excluded). Zero disables.
    pub minimum_order: Money,
    /// Minimum number of non-pack items per order.
    pub minimum_quantity: Option<i64>,
}

impl Default for CheckoutRules {
    fn default() -> Self {
        CheckoutRules {
            min_address_length: DEFAULT_MIN_ADDRESS_LENGTH,
            minimum_order: Money::zero(),
            minimum_quantity: None,
        }
    }
}

/// Output of a successful validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    /// `01XXXXXXXXX`.
    pub phone: String,
    pub area: DeliveryArea,
    pub pricing: PricingResult,
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that a field is non-empty after trimming.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Normalises a Bangladeshi mobile number to `01XXXXXXXXX`.
///
/// ## Rules
/// - Spaces, dashes, dots and parentheses are ignored
/// - A `+880` / `880` country code becomes the leading `0`
/// - A 10-digit number starting with `1` gets its leading `0` back
/// - Result must be `01` + operator digit `3`-`9` + 8 digits
///
/// Returns `None` when the input is not a valid number.
pub fn normalize_bd_phone(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let national = if let Some(rest) = compact.strip_prefix("+88") {
        rest.to_string()
    } else if compact.len() == 13 && compact.starts_with("880") {
        compact[2..].to_string()
    } else if compact.len() == 10 && compact.starts_with('1') {
        format!("0{}", compact)
    } else {
        compact
    };

    let bytes = national.as_bytes();
    let valid = bytes.len() == 11
        && bytes.iter().all(u8::is_ascii_digit)
        && bytes[0] == b'0'
        && bytes[1] == b'1'
        && (b'3'..=b'9').contains(&bytes[2]);

    valid.then_some(national)
}

/// Validates a Bangladeshi mobile number and returns it normalised.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_bd_phone;
///
/// assert_eq!(validate_bd_phone("8801812345678").unwrap(), "01812345678");
/// assert!(validate_bd_phone("12345").is_err());
/// ```
pub fn validate_bd_phone(raw: &str) -> ValidationResult<String> {
    normalize_bd_phone(raw).ok_or(ValidationError::InvalidPhone)
}

/// Validates that an address is long enough to deliver to.
///
/// Length is counted in characters, so Bangla addresses are not penalised
/// for their multi-byte encoding.
pub fn validate_address(address: &str, min_length: usize) -> ValidationResult<()> {
    if address.trim().chars().count() < min_length {
        return Err(ValidationError::AddressTooShort { min: min_length });
    }
    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `MAX_ITEM_QUANTITY` (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Zero is allowed (free gifts)
/// - Must not exceed `MAX_UNIT_PRICE_TAKA`
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if price > Money::from_taka(MAX_UNIT_PRICE_TAKA) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_TAKA,
        });
    }

    Ok(())
}

/// Validates the number of lines in a submitted cart.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::TooManyItems {
            max: MAX_CART_ITEMS,
        });
    }
    Ok(())
}

/// Validates the storefront minimums against a priced cart.
pub fn validate_minimum_order(pricing: &PricingResult, rules: &CheckoutRules) -> ValidationResult<()> {
    if pricing.subtotal < rules.minimum_order {
        return Err(ValidationError::BelowMinimumOrder {
            minimum: rules.minimum_order,
        });
    }

    if let Some(minimum) = rules.minimum_quantity {
        if pricing.total_quantity < minimum {
            return Err(ValidationError::BelowMinimumQuantity { minimum });
        }
    }

    Ok(())
}

// =============================================================================
// Checkout Gate
// =============================================================================

/// Runs checkout steps 1-6 in order.
///
/// Prices come from `items` as given. The server calls this first with the
/// submitted lines, then re-prices against the catalog once stock is
/// checked.
pub fn validate_checkout(
    customer: &CustomerDetails,
    items: &[LineItem],
    policy: &PricingPolicy,
    rules: &CheckoutRules,
) -> ValidationResult<ValidatedCheckout> {
    // 1. Required fields
    validate_required("name", &customer.name)?;
    validate_required("phone", &customer.phone)?;
    validate_required("address", &customer.address)?;

    // 2. Delivery area
    let area = customer.area.ok_or(ValidationError::DeliveryAreaRequired)?;

    // 3. Cart
    if items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    validate_cart_size(items.len())?;
    for item in items {
        validate_quantity(item.quantity)?;
        validate_price(item.unit_price)?;
    }

    // 4. Phone
    let phone = validate_bd_phone(&customer.phone)?;

    // 5. Address
    validate_address(&customer.address, rules.min_address_length)?;

    // 6. Minimums
    let pricing = policy.price(items, Some(area));
    validate_minimum_order(&pricing, rules)?;

    Ok(ValidatedCheckout {
        phone,
        area,
        pricing,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
