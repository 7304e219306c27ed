#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// Forward-mode automatic differentiation with derivative structures: a value and
/// all its partial derivatives up to a given order with respect to a given
/// number of free parameters, propagated exactly through arithmetic and
/// elementary functions.
///
///# Example
/// ```
/// use RustedAutoDiff::differentiation::derivative_structure::DerivativeStructure;
/// // f(x) = exp(x) sin(x), derivatives up to order 3 at x = 0.5
/// let x = DerivativeStructure::single_variable(3, 0.5);
/// let f = &x.exp() * &x.sin();
/// println!("f = {}", f);
/// let f1 = f.get_partial_derivative(&[1]).unwrap();
/// let expected = 0.5_f64.exp() * (0.5_f64.sin() + 0.5_f64.cos());
/// assert!((f1 - expected).abs() < 1e-14);
/// ```
/// ________________________________________________________________________________________________________________________________
/// # Compiler
/// layout of the derivative arrays for a (free parameters, order) pair and the
/// precomputed product and composition rules; instances are cached and shared
pub mod DSCompiler;
/// arithmetic kernels of the compiler: linear operations, products, powers, roots, composition
pub mod DSCompiler_arithmetic;
/// elementary function kernels of the compiler
pub mod DSCompiler_functions;
/// field abstraction: code generic over doubles and derivative structures
pub mod DS_field;
/// the user-facing value type
pub mod derivative_structure;
/// operators and serialization of derivative structures
pub mod derivative_structure_ops;
/// error type shared by the module
pub mod errors;
/// accurate dot products, IEEE remainder, binary scaling
pub mod math_utils;
