//! # Derivative Structure
//!
//! A value together with all its partial derivatives up to a fixed order with
//! respect to a fixed number of free parameters.
//!
//! ## Purpose
//!
//! `DerivativeStructure` is the algebraic type of the forward-mode automatic
//! differentiation engine: build the free parameters as variables, combine
//! them with ordinary arithmetic and elementary functions, and read back the
//! value and any partial derivative of the result. Derivatives are exact up to
//! floating point accuracy, there is no symbolic manipulation and no finite
//! differencing.
//!
//! ## Main Methods
//!
//! ### Construction
//! - `constant(parameters, order, value)` - constant function
//! - `variable(parameters, order, index, value)` - the index-th free parameter
//! - `single_variable(order, value)` - the only free parameter of a univariate problem
//! - `from_derivatives(order, derivatives)` - univariate, explicit derivatives
//! - `from_gradient(parameters, 1, derivatives)` - value followed by the gradient
//! - `from_all_derivatives(parameters, order, data)` - full layout
//! - `from_linear_combination(&[(a1, &ds1), (a2, &ds2), ...])`
//!
//! ### Reading
//! - `get_value()`, `get_partial_derivative(&[orders])`, `get_all_derivatives()`
//! - `taylor(&[deltas])` - evaluate the truncated Taylor expansion
//!
//! ### Operations
//! Every operation returns a new structure; operands are never modified.
//! Binary operations between structures check that free parameters and order
//! agree and return `DSResult`. Unary operations cannot fail: domain errors
//! propagate as NaN or infinities following IEEE 754.
//!
//! ## Example
//! ```
//! use RustedAutoDiff::differentiation::derivative_structure::DerivativeStructure;
//! // f(x, y) = x^2 y + sin(y) at x = 2, y = 0.5, derivatives up to order 2
//! let x = DerivativeStructure::variable(2, 2, 0, 2.0).unwrap();
//! let y = DerivativeStructure::variable(2, 2, 1, 0.5).unwrap();
//! let f = &(&(&x * &x) * &y) + &y.sin();
//! assert!((f.get_partial_derivative(&[1, 0]).unwrap() - 2.0).abs() < 1e-15); // 2xy
//! assert!((f.get_partial_derivative(&[1, 1]).unwrap() - 4.0).abs() < 1e-15); // 2x
//! ```
use crate::differentiation::DSCompiler::{DSCompiler, get_compiler};
use crate::differentiation::DS_field::DSField;
use crate::differentiation::derivative_structure_ops::DSDataTransfer;
use crate::differentiation::errors::{DSResult, DerivativeError};
use crate::differentiation::math_utils;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// binary exponent gap from which the smaller hypot operand is below machine epsilon
const NEGLIGIBLE_EXPONENT_GAP: i32 = 53;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DSDataTransfer", into = "DSDataTransfer")]
pub struct DerivativeStructure {
    compiler: Arc<DSCompiler>,
    data: Vec<f64>,
}

impl DerivativeStructure {
    ///////////////////////////////////////////////////////////////////////////////////////////
    //                                    CONSTRUCTION
    ///////////////////////////////////////////////////////////////////////////////////////////

    fn zeros(compiler: Arc<DSCompiler>) -> Self {
        let size = compiler.get_size();
        DerivativeStructure {
            compiler,
            data: vec![0.0; size],
        }
    }

    /// constant function: the value and nothing else
    pub fn constant(parameters: usize, order: usize, value: f64) -> Self {
        let mut ds = Self::zeros(get_compiler(parameters, order));
        ds.data[0] = value;
        ds
    }

    /// the index-th free parameter, with the given value
    pub fn variable(parameters: usize, order: usize, index: usize, value: f64) -> DSResult<Self> {
        if index >= parameters {
            return Err(DerivativeError::OutOfRange {
                index,
                lower: 0,
                upper: parameters.saturating_sub(1),
            });
        }
        let mut ds = Self::constant(parameters, order, value);
        if order > 0 {
            let mut orders = vec![0; parameters];
            orders[index] = 1;
            let slot = ds.compiler.get_partial_derivative_index(&orders)?;
            ds.data[slot] = 1.0;
        }
        Ok(ds)
    }

    /// the free parameter of a problem with only one
    pub fn single_variable(order: usize, value: f64) -> Self {
        let mut ds = Self::constant(1, order, value);
        if order > 0 {
            ds.data[1] = 1.0;
        }
        ds
    }

    /// structure from its whole backing array, in the compiler enumeration order
    pub fn from_all_derivatives(parameters: usize, order: usize, data: &[f64]) -> DSResult<Self> {
        let compiler = get_compiler(parameters, order);
        if data.len() != compiler.get_size() {
            return Err(DerivativeError::DimensionMismatch {
                found: data.len(),
                expected: compiler.get_size(),
            });
        }
        Ok(DerivativeStructure {
            compiler,
            data: data.to_vec(),
        })
    }

    /// one free parameter: derivatives[k] is the k-th derivative (derivatives[0] the value)
    pub fn from_derivatives(order: usize, derivatives: &[f64]) -> DSResult<Self> {
        Self::from_all_derivatives(1, order, derivatives)
    }

    /// value followed by the first partial derivatives; only order 1 is supported
    pub fn from_gradient(parameters: usize, order: usize, derivatives: &[f64]) -> DSResult<Self> {
        if order != 1 {
            return Err(DerivativeError::DimensionMismatch {
                found: order,
                expected: 1,
            });
        }
        Self::from_all_derivatives(parameters, 1, derivatives)
    }

    /// Σ a_i ds_i, every slot computed with an accurate dot product
    pub fn from_linear_combination(terms: &[(f64, &DerivativeStructure)]) -> DSResult<Self> {
        let Some((_, first)) = terms.first() else {
            return Err(DerivativeError::PreconditionViolation(
                "linear combination needs at least one term".to_string(),
            ));
        };
        for (_, ds) in terms.iter().skip(1) {
            first.compiler.check_compatibility(&ds.compiler)?;
        }
        let coefficients: Vec<f64> = terms.iter().map(|(a, _)| *a).collect();
        let operands: Vec<&[f64]> = terms.iter().map(|(_, ds)| ds.data.as_slice()).collect();
        let mut result = Self::zeros(Arc::clone(&first.compiler));
        first
            .compiler
            .linear_combination(&coefficients, &operands, &mut result.data);
        Ok(result)
    }

    /// constant with the same free parameters and order as self
    pub fn create_constant(&self, value: f64) -> Self {
        let mut ds = Self::zeros(Arc::clone(&self.compiler));
        ds.data[0] = value;
        ds
    }

    fn unary(&self, kernel: impl FnOnce(&DSCompiler, &[f64], &mut [f64])) -> Self {
        let mut result = Self::zeros(Arc::clone(&self.compiler));
        kernel(&self.compiler, &self.data, &mut result.data);
        result
    }

    fn binary(
        &self,
        other: &DerivativeStructure,
        kernel: impl FnOnce(&DSCompiler, &[f64], &[f64], &mut [f64]),
    ) -> DSResult<Self> {
        self.compiler.check_compatibility(&other.compiler)?;
        let mut result = Self::zeros(Arc::clone(&self.compiler));
        kernel(&self.compiler, &self.data, &other.data, &mut result.data);
        Ok(result)
    }

    fn map_slots(&self, f: impl Fn(f64) -> f64) -> Self {
        DerivativeStructure {
            compiler: Arc::clone(&self.compiler),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    ///////////////////////////////////////////////////////////////////////////////////////////
    //                                     ACCESSORS
    ///////////////////////////////////////////////////////////////////////////////////////////

    pub fn get_free_parameters(&self) -> usize {
        self.compiler.get_free_parameters()
    }

    pub fn get_order(&self) -> usize {
        self.compiler.get_order()
    }

    pub fn get_value(&self) -> f64 {
        self.data[0]
    }

    pub fn get_real(&self) -> f64 {
        self.data[0]
    }

    /// partial derivative of the given orders, one entry per free parameter
    pub fn get_partial_derivative(&self, orders: &[usize]) -> DSResult<f64> {
        let index = self.compiler.get_partial_derivative_index(orders)?;
        Ok(self.data[index])
    }

    /// copy of the backing array (value first, then the derivatives in layout order)
    pub fn get_all_derivatives(&self) -> Vec<f64> {
        self.data.clone()
    }

    pub fn derivatives(&self) -> &[f64] {
        &self.data
    }

    pub fn get_field(&self) -> DSField {
        DSField::new(self.get_free_parameters(), self.get_order())
    }

    /// binary exponent of the value
    pub fn get_exponent(&self) -> i32 {
        math_utils::get_exponent(self.data[0])
    }

    /// Σ over stored multi-indices k of ∂^k f / k! * delta^k
    pub fn taylor(&self, delta: &[f64]) -> DSResult<f64> {
        if delta.len() != self.get_free_parameters() {
            return Err(DerivativeError::DimensionMismatch {
                found: delta.len(),
                expected: self.get_free_parameters(),
            });
        }
        Ok(self.compiler.taylor(&self.data, delta))
    }

    ///////////////////////////////////////////////////////////////////////////////////////////
    //                                    ARITHMETIC
    ///////////////////////////////////////////////////////////////////////////////////////////

    pub fn add(&self, a: &DerivativeStructure) -> DSResult<Self> {
        self.binary(a, DSCompiler::add)
    }

    pub fn add_scalar(&self, a: f64) -> Self {
        let mut ds = self.clone();
        ds.data[0] += a;
        ds
    }

    pub fn subtract(&self, a: &DerivativeStructure) -> DSResult<Self> {
        self.binary(a, DSCompiler::subtract)
    }

    pub fn subtract_scalar(&self, a: f64) -> Self {
        self.add_scalar(-a)
    }

    pub fn multiply(&self, a: &DerivativeStructure) -> DSResult<Self> {
        self.binary(a, DSCompiler::multiply)
    }

    pub fn multiply_scalar(&self, a: f64) -> Self {
        self.map_slots(|v| v * a)
    }

    pub fn divide(&self, a: &DerivativeStructure) -> DSResult<Self> {
        self.binary(a, DSCompiler::divide)
    }

    pub fn divide_scalar(&self, a: f64) -> Self {
        self.map_slots(|v| v / a)
    }

    pub fn negate(&self) -> Self {
        self.map_slots(|v| -v)
    }

    pub fn reciprocal(&self) -> Self {
        self.unary(DSCompiler::reciprocal)
    }

    /// IEEE remainder; the derivatives are those of self - k a
    pub fn remainder(&self, a: &DerivativeStructure) -> DSResult<Self> {
        self.binary(a, DSCompiler::remainder)
    }

    /// IEEE remainder by a constant; the derivatives are those of self
    pub fn remainder_scalar(&self, a: f64) -> Self {
        let mut ds = self.clone();
        ds.data[0] = math_utils::ieee_remainder(ds.data[0], a);
        ds
    }

    /// Σ a_i b_i; the value uses an accurate dot product of the values,
    /// the derivatives follow the product rule term by term
    pub fn linear_combination(
        a: &[DerivativeStructure],
        b: &[DerivativeStructure],
    ) -> DSResult<Self> {
        check_pairs(a.len(), b.len())?;
        let a_values: Vec<f64> = a.iter().map(|ds| ds.get_value()).collect();
        let b_values: Vec<f64> = b.iter().map(|ds| ds.get_value()).collect();
        let accurate_value = math_utils::linear_combination(&a_values, &b_values);

        let mut simple = a[0].multiply(&b[0])?;
        for (ai, bi) in a.iter().zip(b.iter()).skip(1) {
            simple = simple.add(&ai.multiply(bi)?)?;
        }
        simple.data[0] = accurate_value;
        Ok(simple)
    }

    /// Σ a_i b_i with constant coefficients a_i
    pub fn linear_combination_scalars(a: &[f64], b: &[DerivativeStructure]) -> DSResult<Self> {
        check_pairs(a.len(), b.len())?;
        let terms: Vec<(f64, &DerivativeStructure)> = a.iter().copied().zip(b.iter()).collect();
        Self::from_linear_combination(&terms)
    }

    ///////////////////////////////////////////////////////////////////////////////////////////
    //                           SIGN, ROUNDING AND SCALING
    ///////////////////////////////////////////////////////////////////////////////////////////

    /// |x|; the sign bit decides, so -0.0 has derivative -1
    pub fn abs(&self) -> Self {
        if self.data[0].is_sign_negative() {
            self.negate()
        } else {
            self.clone()
        }
    }

    /// sign of the value (signed zeros and NaN kept), all derivatives 0
    pub fn signum(&self) -> Self {
        let v = self.data[0];
        let sign = if v == 0.0 || v.is_nan() { v } else { 1.0_f64.copysign(v) };
        self.create_constant(sign)
    }

    pub fn ceil(&self) -> Self {
        self.create_constant(self.data[0].ceil())
    }

    pub fn floor(&self) -> Self {
        self.create_constant(self.data[0].floor())
    }

    /// nearest integer, ties to even
    pub fn rint(&self) -> Self {
        self.create_constant(math_utils::rint(self.data[0]))
    }

    /// nearest integer value, ties rounded up
    pub fn round(&self) -> i64 {
        math_utils::round_half_up(self.data[0])
    }

    /// self or -self (value and derivatives together) so that the value has the sign of sign
    pub fn copy_sign(&self, sign: &DerivativeStructure) -> DSResult<Self> {
        self.compiler.check_compatibility(&sign.compiler)?;
        Ok(self.copy_sign_scalar(sign.data[0]))
    }

    /// scalar variant of copy_sign; a NaN sign counts as positive
    pub fn copy_sign_scalar(&self, sign: f64) -> Self {
        let negative = sign.is_sign_negative() && !sign.is_nan();
        if self.data[0].is_sign_negative() == negative {
            self.clone()
        } else {
            self.negate()
        }
    }

    /// self * 2^n, slot by slot
    pub fn scalb(&self, n: i32) -> Self {
        self.map_slots(|v| math_utils::scalb(v, n))
    }

    /// sqrt(self^2 + y^2) without intermediate overflow or underflow
    pub fn hypot(&self, y: &DerivativeStructure) -> DSResult<Self> {
        self.compiler.check_compatibility(&y.compiler)?;
        let (xv, yv) = (self.data[0], y.data[0]);
        if xv.is_infinite() || yv.is_infinite() {
            return Ok(self.create_constant(f64::INFINITY));
        }
        if xv.is_nan() || yv.is_nan() {
            return Ok(self.create_constant(f64::NAN));
        }

        let exp_x = self.get_exponent();
        let exp_y = y.get_exponent();
        if exp_x >= exp_y + NEGLIGIBLE_EXPONENT_GAP {
            // y is negligible with respect to x
            Ok(self.abs())
        } else if exp_y >= exp_x + NEGLIGIBLE_EXPONENT_GAP {
            Ok(y.abs())
        } else {
            // common power of two scaling, exact in binary
            let middle_exp = (exp_x + exp_y) / 2;
            let scaled_x = self.scalb(-middle_exp);
            let scaled_y = y.scalb(-middle_exp);
            let scaled_h = scaled_x
                .multiply(&scaled_x)?
                .add(&scaled_y.multiply(&scaled_y)?)?
                .sqrt();
            Ok(scaled_h.scalb(middle_exp))
        }
    }

    ///////////////////////////////////////////////////////////////////////////////////////////
    //                                 POWERS AND ROOTS
    ///////////////////////////////////////////////////////////////////////////////////////////

    /// integer power; pow_int(0) is the field one
    pub fn pow_int(&self, n: i32) -> Self {
        self.unary(|c, x, r| c.pow_int(x, n, r))
    }

    /// real power: integral exponents use the integer power table, others exp(p ln(x))
    pub fn pow(&self, p: f64) -> Self {
        if p.fract() == 0.0 && p.abs() <= f64::from(i32::MAX) {
            self.pow_int(p as i32)
        } else {
            self.unary(|c, x, r| c.pow_real(x, p, r))
        }
    }

    /// self^e through exp(e ln(self))
    pub fn pow_structure(&self, e: &DerivativeStructure) -> DSResult<Self> {
        self.binary(e, DSCompiler::pow_structure)
    }

    /// a^x for a constant base
    pub fn pow_base(a: f64, x: &DerivativeStructure) -> Self {
        x.unary(|c, operand, r| c.pow_base(a, operand, r))
    }

    pub fn sqrt(&self) -> Self {
        self.unary(|c, x, r| c.root_n(x, 2, r))
    }

    pub fn cbrt(&self) -> Self {
        self.unary(|c, x, r| c.root_n(x, 3, r))
    }

    /// n-th root; at 0 the first derivative is +Infinity and, for a generic operand,
    /// the higher ones are NaN
    pub fn root_n(&self, n: usize) -> DSResult<Self> {
        if n == 0 {
            return Err(DerivativeError::PreconditionViolation(
                "root order must be positive".to_string(),
            ));
        }
        Ok(self.unary(|c, x, r| c.root_n(x, n, r)))
    }

    ///////////////////////////////////////////////////////////////////////////////////////////
    //                               ELEMENTARY FUNCTIONS
    ///////////////////////////////////////////////////////////////////////////////////////////

    /// f(self) where f[k] is the k-th derivative of f at the value of self
    pub fn compose(&self, f: &[f64]) -> DSResult<Self> {
        if f.len() != self.get_order() + 1 {
            return Err(DerivativeError::DimensionMismatch {
                found: f.len(),
                expected: self.get_order() + 1,
            });
        }
        Ok(self.unary(|c, x, r| c.compose(x, f, r)))
    }

    pub fn exp(&self) -> Self {
        self.unary(DSCompiler::exp)
    }

    /// exp(self) - 1
    pub fn exp_m1(&self) -> Self {
        self.unary(DSCompiler::exp_m1)
    }

    /// natural logarithm
    pub fn ln(&self) -> Self {
        self.unary(DSCompiler::ln)
    }

    /// ln(1 + self)
    pub fn ln_1p(&self) -> Self {
        self.unary(DSCompiler::ln_1p)
    }

    pub fn log10(&self) -> Self {
        self.unary(DSCompiler::log10)
    }

    pub fn cos(&self) -> Self {
        self.unary(DSCompiler::cos)
    }

    pub fn sin(&self) -> Self {
        self.unary(DSCompiler::sin)
    }

    pub fn tan(&self) -> Self {
        self.unary(DSCompiler::tan)
    }

    pub fn acos(&self) -> Self {
        self.unary(DSCompiler::acos)
    }

    pub fn asin(&self) -> Self {
        self.unary(DSCompiler::asin)
    }

    pub fn atan(&self) -> Self {
        self.unary(DSCompiler::atan)
    }

    /// four quadrant arctangent of self / x (self is the ordinate)
    pub fn atan2(&self, x: &DerivativeStructure) -> DSResult<Self> {
        self.binary(x, DSCompiler::atan2)
    }

    pub fn cosh(&self) -> Self {
        self.unary(DSCompiler::cosh)
    }

    pub fn sinh(&self) -> Self {
        self.unary(DSCompiler::sinh)
    }

    pub fn tanh(&self) -> Self {
        self.unary(DSCompiler::tanh)
    }

    pub fn acosh(&self) -> Self {
        self.unary(DSCompiler::acosh)
    }

    pub fn asinh(&self) -> Self {
        self.unary(DSCompiler::asinh)
    }

    pub fn atanh(&self) -> Self {
        self.unary(DSCompiler::atanh)
    }

    pub fn to_degrees(&self) -> Self {
        self.map_slots(f64::to_degrees)
    }

    pub fn to_radians(&self) -> Self {
        self.map_slots(f64::to_radians)
    }
}

fn check_pairs(a_len: usize, b_len: usize) -> DSResult<()> {
    if a_len != b_len {
        return Err(DerivativeError::DimensionMismatch {
            found: b_len,
            expected: a_len,
        });
    }
    if a_len == 0 {
        return Err(DerivativeError::PreconditionViolation(
            "linear combination needs at least one term".to_string(),
        ));
    }
    Ok(())
}

/// same free parameters, same order and bit-identical data
impl PartialEq for DerivativeStructure {
    fn eq(&self, other: &Self) -> bool {
        self.get_free_parameters() == other.get_free_parameters()
            && self.get_order() == other.get_order()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl fmt::Display for DerivativeStructure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DS(p={}, o={})[{}]",
            self.get_free_parameters(),
            self.get_order(),
            self.data.iter().join(", ")
        )
    }
}
