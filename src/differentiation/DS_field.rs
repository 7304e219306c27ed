//! Field abstraction over derivative structures and plain doubles.
//!
//! Code written against [`RealFieldElement`] runs unchanged on `f64` (values
//! only) and on [`DerivativeStructure`] (values and derivatives). The field of
//! a structure supplies the additive and multiplicative identities with the
//! right number of free parameters and order.
use crate::differentiation::derivative_structure::DerivativeStructure;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub trait Field {
    type Element;
    fn get_zero(&self) -> Self::Element;
    fn get_one(&self) -> Self::Element;
}

pub trait RealFieldElement:
    Sized
    + Clone
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Mul<f64, Output = Self>
{
    type FieldType: Field<Element = Self>;

    fn get_field(&self) -> Self::FieldType;
    fn get_real(&self) -> f64;
    fn abs(&self) -> Self;
    fn reciprocal(&self) -> Self;
    fn sqrt(&self) -> Self;
    fn pow_int(&self, n: i32) -> Self;
    fn exp(&self) -> Self;
    fn ln(&self) -> Self;
    fn sin(&self) -> Self;
    fn cos(&self) -> Self;
}

/// field of all structures sharing one (free parameters, order) pair
#[derive(Debug, Clone)]
pub struct DSField {
    zero: DerivativeStructure,
    one: DerivativeStructure,
}

impl DSField {
    pub fn new(parameters: usize, order: usize) -> Self {
        DSField {
            zero: DerivativeStructure::constant(parameters, order, 0.0),
            one: DerivativeStructure::constant(parameters, order, 1.0),
        }
    }

    pub fn get_free_parameters(&self) -> usize {
        self.zero.get_free_parameters()
    }

    pub fn get_order(&self) -> usize {
        self.zero.get_order()
    }
}

impl Field for DSField {
    type Element = DerivativeStructure;

    fn get_zero(&self) -> DerivativeStructure {
        self.zero.clone()
    }

    fn get_one(&self) -> DerivativeStructure {
        self.one.clone()
    }
}

impl PartialEq for DSField {
    fn eq(&self, other: &Self) -> bool {
        self.get_free_parameters() == other.get_free_parameters() && self.get_order() == other.get_order()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RealField64;

impl Field for RealField64 {
    type Element = f64;

    fn get_zero(&self) -> f64 {
        0.0
    }

    fn get_one(&self) -> f64 {
        1.0
    }
}

impl RealFieldElement for DerivativeStructure {
    type FieldType = DSField;

    fn get_field(&self) -> DSField {
        DerivativeStructure::get_field(self)
    }
    fn get_real(&self) -> f64 {
        DerivativeStructure::get_real(self)
    }
    fn abs(&self) -> Self {
        DerivativeStructure::abs(self)
    }
    fn reciprocal(&self) -> Self {
        DerivativeStructure::reciprocal(self)
    }
    fn sqrt(&self) -> Self {
        DerivativeStructure::sqrt(self)
    }
    fn pow_int(&self, n: i32) -> Self {
        DerivativeStructure::pow_int(self, n)
    }
    fn exp(&self) -> Self {
        DerivativeStructure::exp(self)
    }
    fn ln(&self) -> Self {
        DerivativeStructure::ln(self)
    }
    fn sin(&self) -> Self {
        DerivativeStructure::sin(self)
    }
    fn cos(&self) -> Self {
        DerivativeStructure::cos(self)
    }
}

impl RealFieldElement for f64 {
    type FieldType = RealField64;

    fn get_field(&self) -> RealField64 {
        RealField64
    }
    fn get_real(&self) -> f64 {
        *self
    }
    fn abs(&self) -> Self {
        f64::abs(*self)
    }
    fn reciprocal(&self) -> Self {
        1.0 / *self
    }
    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }
    fn pow_int(&self, n: i32) -> Self {
        self.powi(n)
    }
    fn exp(&self) -> Self {
        f64::exp(*self)
    }
    fn ln(&self) -> Self {
        f64::ln(*self)
    }
    fn sin(&self) -> Self {
        f64::sin(*self)
    }
    fn cos(&self) -> Self {
        f64::cos(*self)
    }
}

/// Horner evaluation of Σ coefficients[k] x^k in any real field
pub fn polynomial_value<T: RealFieldElement>(coefficients: &[f64], x: &T) -> T {
    coefficients
        .iter()
        .rev()
        .fold(x.get_field().get_zero(), |acc, &c| acc * x.clone() + c)
}

#[cfg(test)]
mod tests_DS_field {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_field_identities() {
        let field = DSField::new(3, 2);
        let zero = field.get_zero();
        let one = field.get_one();
        assert_eq!(zero.get_free_parameters(), 3);
        assert_eq!(one.get_order(), 2);
        assert_eq!(one.get_value(), 1.0);
        assert!(zero.derivatives().iter().all(|&d| d == 0.0));
        assert_eq!(field, DSField::new(3, 2));
        assert_ne!(field, DSField::new(3, 1));
    }

    #[test]
    fn test_structure_field_matches_its_shape() {
        let x = DerivativeStructure::variable(2, 4, 1, 0.25).unwrap();
        let field = RealFieldElement::get_field(&x);
        assert_eq!(field.get_free_parameters(), 2);
        assert_eq!(field.get_order(), 4);
    }

    #[test]
    fn test_polynomial_on_doubles_and_structures() {
        // p(x) = 1 - 3x + 2x^3, p' = -3 + 6x^2, p'' = 12x
        let coefficients = [1.0, -3.0, 0.0, 2.0];
        let x0 = 1.5;
        assert_relative_eq!(polynomial_value(&coefficients, &x0), 3.25, epsilon = 1e-15);

        let x = DerivativeStructure::single_variable(3, x0);
        let p = polynomial_value(&coefficients, &x);
        assert_relative_eq!(p.get_value(), 3.25, epsilon = 1e-15);
        assert_relative_eq!(p.get_partial_derivative(&[1]).unwrap(), 10.5, epsilon = 1e-14);
        assert_relative_eq!(p.get_partial_derivative(&[2]).unwrap(), 18.0, epsilon = 1e-14);
        assert_relative_eq!(p.get_partial_derivative(&[3]).unwrap(), 12.0, epsilon = 1e-14);
    }

    fn gaussian<T: RealFieldElement>(x: &T) -> T {
        (-(x.clone() * x.clone()) * 0.5).exp()
    }

    #[test]
    fn test_generic_function_derivative() {
        let x = DerivativeStructure::single_variable(1, 0.7);
        let g = gaussian(&x);
        let g_value = gaussian(&0.7_f64);
        assert_relative_eq!(g.get_value(), g_value, epsilon = 1e-15);
        assert_relative_eq!(g.get_partial_derivative(&[1]).unwrap(), -0.7 * g_value, epsilon = 1e-15);
    }
}
