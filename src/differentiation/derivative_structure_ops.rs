//! Operator overloading for [`DerivativeStructure`] and its serialized form.
//!
//! Operators between two structures panic when free parameters or order differ,
//! with the message of the corresponding [`DerivativeError`]. Use the named
//! methods (`add`, `multiply`, ...) to get a `DSResult` instead.
use crate::differentiation::derivative_structure::DerivativeStructure;
use crate::differentiation::errors::DerivativeError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Sub, SubAssign};

macro_rules! impl_structure_op {
    ($op_trait:ident, $op_fn:ident, $method:ident) => {
        impl $op_trait<&DerivativeStructure> for &DerivativeStructure {
            type Output = DerivativeStructure;
            fn $op_fn(self, rhs: &DerivativeStructure) -> DerivativeStructure {
                DerivativeStructure::$method(self, rhs).unwrap_or_else(|e| panic!("{}", e))
            }
        }

        impl $op_trait<DerivativeStructure> for DerivativeStructure {
            type Output = DerivativeStructure;
            fn $op_fn(self, rhs: DerivativeStructure) -> DerivativeStructure {
                $op_trait::$op_fn(&self, &rhs)
            }
        }

        impl $op_trait<&DerivativeStructure> for DerivativeStructure {
            type Output = DerivativeStructure;
            fn $op_fn(self, rhs: &DerivativeStructure) -> DerivativeStructure {
                $op_trait::$op_fn(&self, rhs)
            }
        }

        impl $op_trait<DerivativeStructure> for &DerivativeStructure {
            type Output = DerivativeStructure;
            fn $op_fn(self, rhs: DerivativeStructure) -> DerivativeStructure {
                $op_trait::$op_fn(self, &rhs)
            }
        }
    };
}

impl_structure_op!(Add, add, add);
impl_structure_op!(Sub, sub, subtract);
impl_structure_op!(Mul, mul, multiply);
impl_structure_op!(Div, div, divide);
impl_structure_op!(Rem, rem, remainder);

macro_rules! impl_scalar_op {
    ($op_trait:ident, $op_fn:ident, $method:ident) => {
        impl $op_trait<f64> for &DerivativeStructure {
            type Output = DerivativeStructure;
            fn $op_fn(self, rhs: f64) -> DerivativeStructure {
                DerivativeStructure::$method(self, rhs)
            }
        }

        impl $op_trait<f64> for DerivativeStructure {
            type Output = DerivativeStructure;
            fn $op_fn(self, rhs: f64) -> DerivativeStructure {
                DerivativeStructure::$method(&self, rhs)
            }
        }
    };
}

impl_scalar_op!(Add, add, add_scalar);
impl_scalar_op!(Sub, sub, subtract_scalar);
impl_scalar_op!(Mul, mul, multiply_scalar);
impl_scalar_op!(Div, div, divide_scalar);
impl_scalar_op!(Rem, rem, remainder_scalar);

impl Add<&DerivativeStructure> for f64 {
    type Output = DerivativeStructure;
    fn add(self, rhs: &DerivativeStructure) -> DerivativeStructure {
        rhs.add_scalar(self)
    }
}

impl Add<DerivativeStructure> for f64 {
    type Output = DerivativeStructure;
    fn add(self, rhs: DerivativeStructure) -> DerivativeStructure {
        rhs.add_scalar(self)
    }
}

impl Sub<&DerivativeStructure> for f64 {
    type Output = DerivativeStructure;
    fn sub(self, rhs: &DerivativeStructure) -> DerivativeStructure {
        rhs.negate().add_scalar(self)
    }
}

impl Sub<DerivativeStructure> for f64 {
    type Output = DerivativeStructure;
    fn sub(self, rhs: DerivativeStructure) -> DerivativeStructure {
        rhs.negate().add_scalar(self)
    }
}

impl Mul<&DerivativeStructure> for f64 {
    type Output = DerivativeStructure;
    fn mul(self, rhs: &DerivativeStructure) -> DerivativeStructure {
        rhs.multiply_scalar(self)
    }
}

impl Mul<DerivativeStructure> for f64 {
    type Output = DerivativeStructure;
    fn mul(self, rhs: DerivativeStructure) -> DerivativeStructure {
        rhs.multiply_scalar(self)
    }
}

impl Div<&DerivativeStructure> for f64 {
    type Output = DerivativeStructure;
    fn div(self, rhs: &DerivativeStructure) -> DerivativeStructure {
        rhs.reciprocal().multiply_scalar(self)
    }
}

impl Div<DerivativeStructure> for f64 {
    type Output = DerivativeStructure;
    fn div(self, rhs: DerivativeStructure) -> DerivativeStructure {
        rhs.reciprocal().multiply_scalar(self)
    }
}

impl Neg for &DerivativeStructure {
    type Output = DerivativeStructure;
    fn neg(self) -> DerivativeStructure {
        self.negate()
    }
}

impl Neg for DerivativeStructure {
    type Output = DerivativeStructure;
    fn neg(self) -> DerivativeStructure {
        self.negate()
    }
}

macro_rules! impl_structure_assign {
    ($assign_trait:ident, $assign_fn:ident, $method:ident, $scalar_method:ident) => {
        impl $assign_trait<&DerivativeStructure> for DerivativeStructure {
            fn $assign_fn(&mut self, rhs: &DerivativeStructure) {
                *self = DerivativeStructure::$method(self, rhs).unwrap_or_else(|e| panic!("{}", e));
            }
        }

        impl $assign_trait<f64> for DerivativeStructure {
            fn $assign_fn(&mut self, rhs: f64) {
                *self = DerivativeStructure::$scalar_method(self, rhs);
            }
        }
    };
}

impl_structure_assign!(AddAssign, add_assign, add, add_scalar);
impl_structure_assign!(SubAssign, sub_assign, subtract, subtract_scalar);
impl_structure_assign!(MulAssign, mul_assign, multiply, multiply_scalar);
impl_structure_assign!(DivAssign, div_assign, divide, divide_scalar);

impl std::iter::Sum for DerivativeStructure {
    /// panics on an empty iterator: the free parameters and order of the zero are unknown
    fn sum<I: Iterator<Item = DerivativeStructure>>(mut iter: I) -> Self {
        let first = iter
            .next()
            .unwrap_or_else(|| panic!("cannot sum an empty sequence of derivative structures"));
        iter.fold(first, |acc, ds| acc + ds)
    }
}

///////////////////////////////////////////////////////////////////////////////////////////
//                                    SERIALIZATION
///////////////////////////////////////////////////////////////////////////////////////////

/// Serialized form of a [`DerivativeStructure`]: the compiler is rebuilt from
/// `(parameters, order)` and `data` must have the matching size.
/// Slots are stored as IEEE 754 bit patterns, so NaN and infinities survive
/// formats without a representation for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DSDataTransfer {
    pub parameters: usize,
    pub order: usize,
    pub data: Vec<u64>,
}

impl From<DerivativeStructure> for DSDataTransfer {
    fn from(ds: DerivativeStructure) -> Self {
        DSDataTransfer {
            parameters: ds.get_free_parameters(),
            order: ds.get_order(),
            data: ds.derivatives().iter().map(|v| v.to_bits()).collect(),
        }
    }
}

impl TryFrom<DSDataTransfer> for DerivativeStructure {
    type Error = DerivativeError;

    fn try_from(transfer: DSDataTransfer) -> Result<Self, Self::Error> {
        let data: Vec<f64> = transfer.data.iter().map(|&bits| f64::from_bits(bits)).collect();
        DerivativeStructure::from_all_derivatives(transfer.parameters, transfer.order, &data)
    }
}
