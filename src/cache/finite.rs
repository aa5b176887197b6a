//! Finite Float Check
//!
//! serde_json writes NaN and infinities as `null`, so they have to be caught
//! before encoding. `ensure_finite` walks any `Serialize` value without
//! producing output and fails on the first non-finite float.

use std::fmt::Display;

use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub(crate) struct NotRepresentable(String);

impl ser::Error for NotRepresentable {
    fn custom<T: Display>(msg: T) -> Self {
        NotRepresentable(msg.to_string())
    }
}

/// Fails if `value` contains a NaN or infinite `f32`/`f64` anywhere.
pub(crate) fn ensure_finite<T: Serialize + ?Sized>(
    value: &T,
) -> std::result::Result<(), NotRepresentable> {
    value.serialize(FiniteCheck)
}

fn check_float(v: f64) -> std::result::Result<(), NotRepresentable> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(NotRepresentable(format!("{} cannot be represented in JSON", v)))
    }
}

#[derive(Clone, Copy)]
struct FiniteCheck;

type Checked = std::result::Result<(), NotRepresentable>;

impl Serializer for FiniteCheck {
    type Ok = ();
    type Error = NotRepresentable;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _v: bool) -> Checked {
        Ok(())
    }
    fn serialize_i8(self, _v: i8) -> Checked {
        Ok(())
    }
    fn serialize_i16(self, _v: i16) -> Checked {
        Ok(())
    }
    fn serialize_i32(self, _v: i32) -> Checked {
        Ok(())
    }
    fn serialize_i64(self, _v: i64) -> Checked {
        Ok(())
    }
    fn serialize_i128(self, _v: i128) -> Checked {
        Ok(())
    }
    fn serialize_u8(self, _v: u8) -> Checked {
        Ok(())
    }
    fn serialize_u16(self, _v: u16) -> Checked {
        Ok(())
    }
    fn serialize_u32(self, _v: u32) -> Checked {
        Ok(())
    }
    fn serialize_u64(self, _v: u64) -> Checked {
        Ok(())
    }
    fn serialize_u128(self, _v: u128) -> Checked {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Checked {
        check_float(f64::from(v))
    }
    fn serialize_f64(self, v: f64) -> Checked {
        check_float(v)
    }

    fn serialize_char(self, _v: char) -> Checked {
        Ok(())
    }
    fn serialize_str(self, _v: &str) -> Checked {
        Ok(())
    }
    fn serialize_bytes(self, _v: &[u8]) -> Checked {
        Ok(())
    }
    fn serialize_none(self) -> Checked {
        Ok(())
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Checked {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Checked {
        Ok(())
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Checked {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Checked {
        Ok(())
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Checked {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Checked {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self, NotRepresentable> {
        Ok(self)
    }
    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self, NotRepresentable> {
        Ok(self)
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, NotRepresentable> {
        Ok(self)
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, NotRepresentable> {
        Ok(self)
    }
    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self, NotRepresentable> {
        Ok(self)
    }
    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, NotRepresentable> {
        Ok(self)
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self, NotRepresentable> {
        Ok(self)
    }
}

// == Compound Values ==
impl SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = NotRepresentable;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Checked {
        value.serialize(*self)
    }
    fn end(self) -> Checked {
        Ok(())
    }
}

impl SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = NotRepresentable;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Checked {
        value.serialize(*self)
    }
    fn end(self) -> Checked {
        Ok(())
    }
}

impl SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = NotRepresentable;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Checked {
        value.serialize(*self)
    }
    fn end(self) -> Checked {
        Ok(())
    }
}

impl SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = NotRepresentable;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Checked {
        value.serialize(*self)
    }
    fn end(self) -> Checked {
        Ok(())
    }
}

impl SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = NotRepresentable;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Checked {
        key.serialize(*self)
    }
    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Checked {
        value.serialize(*self)
    }
    fn end(self) -> Checked {
        Ok(())
    }
}

impl SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = NotRepresentable;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Checked {
        value.serialize(*self)
    }
    fn end(self) -> Checked {
        Ok(())
    }
}

impl SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = NotRepresentable;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Checked {
        value.serialize(*self)
    }
    fn end(self) -> Checked {
        Ok(())
    }
}
