//! Checkout request schema and validation.
//!
//! The wire type [`CheckoutRequest`] keeps every field optional so that a
//! missing field produces a message naming it instead of a generic
//! deserialization error. [`CheckoutRequest::validate`] runs the checks in a
//! fixed order and yields a [`Checkout`] whose fields are all known-good:
//!
//! 1. top-level fields present
//! 2. shipping fields present
//! 3. email well-formed
//! 4. at least one item
//! 5. every item has a positive product id, quantity and price
//!
//! Prices and the subtotal must fit the order columns: at most two decimal
//! places and no more than [`MAX_AMOUNT`].
//!
//! Stock and product existence need the database and are checked by the order
//! engine afterwards.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ClientId, ClientIdError, Email, EmailError, ProductId};

/// Largest price or subtotal an order can hold.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, AMOUNT_SCALE);

/// Decimal places kept for prices and subtotals.
pub const AMOUNT_SCALE: u32 = 2;

/// Whether `value` can be stored as a price or subtotal without rounding.
#[must_use]
pub fn fits_amount(value: Decimal) -> bool {
    value.normalize().scale() <= AMOUNT_SCALE && value <= MAX_AMOUNT
}

/// Errors produced by [`CheckoutRequest::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// One or more top-level fields are missing or blank.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The client identifier is malformed.
    #[error("Invalid clientId: {0}")]
    InvalidClientId(#[from] ClientIdError),

    /// The subtotal is zero or negative.
    #[error("subtotal must be greater than zero")]
    InvalidSubtotal,

    /// The subtotal has too many decimal places or is too large.
    #[error("subtotal must have at most 2 decimal places and not exceed 9999999999.99")]
    SubtotalOutOfRange,

    /// One or more required shipping fields are missing or blank.
    #[error("Missing required shipping fields: {}", .0.join(", "))]
    MissingShippingFields(Vec<&'static str>),

    /// The email address failed the format check.
    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The item list is empty.
    #[error("Items must be a non-empty array")]
    EmptyItems,

    /// An item is missing data or has a non-positive value.
    #[error("Invalid item data at index {index}: {reason}")]
    InvalidItem {
        /// Position of the item in the request.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Price times quantity summed over the items doesn't fit a decimal.
    #[error("items total is out of range")]
    ItemsTotalOutOfRange,
}

/// Checkout payload as submitted by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckoutRequest {
    pub client_id: Option<String>,
    pub email: Option<String>,
    pub shipping_data: Option<ShippingDataInput>,
    pub items: Option<Vec<CheckoutItemInput>>,
    pub subtotal: Option<Decimal>,
}

/// Shipping block of a [`CheckoutRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShippingDataInput {
    pub fullname: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub apartment: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// One line of a [`CheckoutRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckoutItemInput {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
}

/// Validated shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub fullname: String,
    pub phone: String,
    pub company: Option<String>,
    pub country: String,
    pub state: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub postal_code: String,
}

/// Validated order line. The price is the unit price the client saw and is
/// frozen into the order as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
}

/// A checkout that passed every check that does not need the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub client_id: ClientId,
    pub email: Email,
    pub shipping: ShippingAddress,
    pub items: Vec<CheckoutItem>,
    pub subtotal: Decimal,
    items_total: Decimal,
}

impl Checkout {
    /// Sum of `price * quantity` over all items.
    #[must_use]
    pub const fn items_total(&self) -> Decimal {
        self.items_total
    }

    /// Requested quantity per product, merging repeated lines.
    #[must_use]
    pub fn quantities_by_product(&self) -> BTreeMap<ProductId, i32> {
        let mut totals = BTreeMap::new();
        for item in &self.items {
            let entry = totals.entry(item.product_id).or_insert(0_i32);
            *entry = entry.saturating_add(item.quantity);
        }
        totals
    }
}

/// `price * quantity` summed over `items`, or `None` on overflow.
fn checked_items_total(items: &[CheckoutItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| total.checked_add(line))
    })
}

/// Trim a field, treating blank strings as absent.
fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl CheckoutRequest {
    /// Run the validation sequence.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckoutError`] encountered, in the order described
    /// in the module documentation.
    pub fn validate(self) -> Result<Checkout, CheckoutError> {
        let client_id = present(self.client_id.as_ref());
        let email = present(self.email.as_ref());

        let mut missing = Vec::new();
        if client_id.is_none() {
            missing.push("clientId");
        }
        if email.is_none() {
            missing.push("email");
        }
        if self.shipping_data.is_none() {
            missing.push("shippingData");
        }
        if self.items.is_none() {
            missing.push("items");
        }
        if self.subtotal.is_none() {
            missing.push("subtotal");
        }

        let (Some(client_id), Some(email), Some(shipping), Some(items), Some(subtotal)) = (
            client_id,
            email,
            self.shipping_data,
            self.items,
            self.subtotal,
        ) else {
            return Err(CheckoutError::MissingFields(missing));
        };

        let client_id = ClientId::parse(&client_id)?;
        if subtotal <= Decimal::ZERO {
            return Err(CheckoutError::InvalidSubtotal);
        }
        if !fits_amount(subtotal) {
            return Err(CheckoutError::SubtotalOutOfRange);
        }

        let shipping = shipping.validate()?;
        let email = Email::parse(&email)?;

        if items.is_empty() {
            return Err(CheckoutError::EmptyItems);
        }

        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| item.validate(index))
            .collect::<Result<Vec<_>, _>>()?;
        let items_total =
            checked_items_total(&items).ok_or(CheckoutError::ItemsTotalOutOfRange)?;

        Ok(Checkout {
            client_id,
            email,
            shipping,
            items,
            subtotal,
            items_total,
        })
    }
}

impl ShippingDataInput {
    fn validate(self) -> Result<ShippingAddress, CheckoutError> {
        let fields = [
            ("fullname", present(self.fullname.as_ref())),
            ("phone", present(self.phone.as_ref())),
            ("country", present(self.country.as_ref())),
            ("state", present(self.state.as_ref())),
            ("address", present(self.address.as_ref())),
            ("city", present(self.city.as_ref())),
            ("postalCode", present(self.postal_code.as_ref())),
        ];

        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(CheckoutError::MissingShippingFields(missing));
        }

        let [fullname, phone, country, state, address, city, postal_code] =
            fields.map(|(_, value)| value.unwrap_or_default());

        Ok(ShippingAddress {
            fullname,
            phone,
            company: present(self.company.as_ref()),
            country,
            state,
            address,
            apartment: present(self.apartment.as_ref()),
            city,
            postal_code,
        })
    }
}

impl CheckoutItemInput {
    fn validate(self, index: usize) -> Result<CheckoutItem, CheckoutError> {
        let invalid = |reason| CheckoutError::InvalidItem { index, reason };

        let product_id = self.product_id.ok_or_else(|| invalid("productId is required"))?;
        if !product_id.is_valid() {
            return Err(invalid("productId must be positive"));
        }
        let quantity = self.quantity.ok_or_else(|| invalid("quantity is required"))?;
        if quantity <= 0 {
            return Err(invalid("quantity must be at least 1"));
        }
        let price = self.price.ok_or_else(|| invalid("price is required"))?;
        if price <= Decimal::ZERO {
            return Err(invalid("price must be greater than zero"));
        }
        if !fits_amount(price) {
            return Err(invalid(
                "price must have at most 2 decimal places and not exceed 9999999999.99",
            ));
        }

        Ok(CheckoutItem {
            product_id,
            quantity,
            price,
        })
    }
}
