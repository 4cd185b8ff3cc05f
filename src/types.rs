//! Identifiers, timestamps and money shared by every row type
use crate::error::{IdError, ParseMoneyError};
use crate::utils;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

// Row identifiers are uuid7 bytes. They print and parse as bech32m with a
// per-kind prefix, so an order id can never be passed where a product id is
// expected, on the command line or in code.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; 16]);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(utils::new_id_bytes())
            }
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }
            pub fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }
            /// Key bytes for this id inside a sled tree.
            pub fn key(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let encoded = utils::encode_id(Self::PREFIX, &self.0).map_err(|_| fmt::Error)?;
                f.write_str(&encoded)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                utils::decode_id(Self::PREFIX, s.trim()).map(Self)
            }
        }

        impl<C> minicbor::Encode<C> for $name {
            fn encode<W: minicbor::encode::Write>(
                &self,
                e: &mut minicbor::Encoder<W>,
                _: &mut C,
            ) -> Result<(), minicbor::encode::Error<W::Error>> {
                e.bytes(&self.0)?.ok()
            }
        }

        impl<'b, C> minicbor::Decode<'b, C> for $name {
            fn decode(
                d: &mut minicbor::Decoder<'b>,
                _: &mut C,
            ) -> Result<Self, minicbor::decode::Error> {
                let bytes = d.bytes()?;
                <[u8; 16]>::try_from(bytes)
                    .map(Self)
                    .map_err(|_| minicbor::decode::Error::message("id must be 16 bytes"))
            }
        }
    };
}

record_id!(
    /// Identity of a storefront user, as supplied by the auth layer.
    UserId,
    "user_"
);
record_id!(ProductId, "product_");
record_id!(OrderId, "order_");
record_id!(ItemId, "item_");

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct TimeStamp(DateTime<Utc>);

impl TimeStamp {
    pub fn new() -> Self {
        Self(Utc::now())
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl<C> minicbor::Encode<C> for TimeStamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// An amount of money in minor currency units (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(cents: u64) -> Self {
        Self(cents)
    }
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(u64::from(quantity)).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoneyError(s.to_owned());
        let (units, cents) = match s.trim().split_once('.') {
            Some((units, cents)) => (units, cents),
            None => (s.trim(), ""),
        };

        if units.is_empty() || !units.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        if cents.len() > 2 || !cents.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let units: u64 = units.parse().map_err(|_| err())?;
        let cents: u64 = match cents.len() {
            0 => 0,
            1 => cents.parse::<u64>().map_err(|_| err())? * 10,
            _ => cents.parse().map_err(|_| err())?,
        };

        units
            .checked_mul(100)
            .and_then(|minor| minor.checked_add(cents))
            .map(Money)
            .ok_or_else(err)
    }
}

impl<C> minicbor::Encode<C> for Money {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.u64(self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Money {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        d.u64().map(Money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_print_with_their_prefix_and_parse_back() {
        let id = OrderId::new();
        let text = id.to_string();

        assert!(text.starts_with("order_1"));
        assert_eq!(text.parse::<OrderId>().unwrap(), id);
    }

    #[test]
    fn ids_reject_the_wrong_prefix() {
        let product = ProductId::new().to_string();

        let err = product.parse::<OrderId>().unwrap_err();
        assert!(matches!(err, IdError::WrongPrefix { .. }));
        assert!("not-an-id".parse::<OrderId>().is_err());
    }

    #[test]
    fn ids_sort_in_creation_order() {
        let first = OrderId::new();
        let second = OrderId::new();
        let third = OrderId::new();

        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn id_encoding() {
        let original = ItemId::new();

        let encoding = minicbor::to_vec(original).unwrap();
        let decode: ItemId = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original).unwrap();
        let decode: TimeStamp = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn money_parses_units_and_cents() {
        assert_eq!("12.34".parse::<Money>().unwrap(), Money::from_minor(1234));
        assert_eq!("12.5".parse::<Money>().unwrap(), Money::from_minor(1250));
        assert_eq!("7".parse::<Money>().unwrap(), Money::from_minor(700));
        assert_eq!("0.05".parse::<Money>().unwrap(), Money::from_minor(5));
    }

    #[test]
    fn money_rejects_negative_and_fractional_cents() {
        assert!("-1.00".parse::<Money>().is_err());
        assert!("1.005".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
    }

    #[test]
    fn money_displays_two_decimals() {
        assert_eq!(Money::from_minor(1234).to_string(), "12.34");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn money_arithmetic_is_checked() {
        let price = Money::from_minor(250);
        assert_eq!(price.checked_mul(3), Some(Money::from_minor(750)));
        assert_eq!(
            price.checked_add(Money::from_minor(50)),
            Some(Money::from_minor(300))
        );
        assert_eq!(Money::from_minor(u64::MAX).checked_mul(2), None);
        assert_eq!(Money::from_minor(u64::MAX).checked_add(price), None);
    }
}
