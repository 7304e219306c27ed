//! # Derivative structure compiler
//!
//! Layout and combinatorial tables shared by every derivative structure with
//! the same number of free parameters and the same derivation order.
//!
//! ## Purpose
//!
//! A derivative structure is a flat `Vec<f64>`: slot 0 holds the value, the
//! other slots hold the (raw, not factorial-normalized) mixed partial
//! derivatives. This module decides which slot holds which partial derivative
//! and precomputes, once per `(parameters, order)` pair, everything the
//! arithmetic kernels need:
//! - `sizes[p][o]`: number of slots of a structure with `p` parameters and order `o`
//! - `derivatives_indirection`: slot -> multi-index of derivation orders
//! - `lower_indirection`: slots of the `(parameters, order - 1)` structure inside this one
//! - `mult_indirection`: Leibniz rule as a list of (coefficient, lhs slot, rhs slot) per slot
//! - `comp_indirection`: Faà di Bruno rule as a list of (coefficient, f order, operand slots) per slot
//!
//! ## Layout
//!
//! The layout is recursive on the last free parameter (Dan Kalman's
//! construction): a structure for `(p, o)` is the `(p - 1, o)` structure
//! (everything not differentiated with respect to the last parameter)
//! followed by the `(p, o - 1)` structure of the derivative with respect to
//! the last parameter. For 2 parameters and order 2 this gives
//! `f, df/dx, d2f/dx2, df/dy, d2f/dxdy, d2f/dy2`.
//!
//! ## Interesting Code Features
//!
//! 1. **Recursive table construction**: the tables of `(p, o)` are derived from
//!    the tables of `(p - 1, o)` and `(p, o - 1)`; the multiplication and
//!    composition rules of the derivative part are obtained by differentiating
//!    the rules of the lower order compiler once more.
//! 2. **Process-wide cache**: compilers are built lazily, stored behind an
//!    `RwLock` in a `OnceLock` and shared through `Arc`; once published they are
//!    never mutated, so structures on different threads read them without locking.
use crate::differentiation::errors::{DSResult, DerivativeError};
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// tables bigger than this are reported at info level when built
const LARGE_TABLE_SIZE: usize = 100_000;

/// one term of the Leibniz rule: coefficient * lhs[lhs_index] * rhs[rhs_index]
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplicationTerm {
    pub coefficient: usize,
    pub lhs_index: usize,
    pub rhs_index: usize,
}

/// one term of the Faà di Bruno rule:
/// coefficient * f^(f_order)(u0) * Π operand[g_indices[i]]
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTerm {
    pub coefficient: usize,
    pub f_order: usize,
    pub g_indices: Vec<usize>,
}

pub struct DSCompiler {
    parameters: usize,
    order: usize,
    sizes: Vec<Vec<usize>>,
    derivatives_indirection: Vec<Vec<usize>>,
    lower_indirection: Vec<usize>,
    mult_indirection: Vec<Vec<MultiplicationTerm>>,
    comp_indirection: Vec<Vec<CompositionTerm>>,
}

static COMPILERS: OnceLock<RwLock<HashMap<(usize, usize), Arc<DSCompiler>>>> = OnceLock::new();

/// get the compiler for (parameters, order), building it (and the lower ones it
/// depends on) on first request
pub fn get_compiler(parameters: usize, order: usize) -> Arc<DSCompiler> {
    let cache = COMPILERS.get_or_init(|| RwLock::new(HashMap::new()));
    {
        let read = cache.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(compiler) = read.get(&(parameters, order)) {
            return Arc::clone(compiler);
        }
    }

    // lower compilers are fetched before taking the write lock
    let value_compiler = if parameters > 0 {
        Some(get_compiler(parameters - 1, order))
    } else {
        None
    };
    let derivative_compiler = if order > 0 {
        Some(get_compiler(parameters, order - 1))
    } else {
        None
    };
    let built = DSCompiler::new(
        parameters,
        order,
        value_compiler.as_deref(),
        derivative_compiler.as_deref(),
    );
    debug!(
        "built derivative structure compiler: {} parameters, order {}, {} slots",
        parameters,
        order,
        built.get_size()
    );
    if built.get_size() > LARGE_TABLE_SIZE {
        info!(
            "large derivative structure layout: {} slots for {} parameters at order {}",
            built.get_size(),
            parameters,
            order
        );
    }

    let mut write = cache.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    // another thread may have published the same compiler meanwhile: keep the first one
    Arc::clone(
        write
            .entry((parameters, order))
            .or_insert_with(|| Arc::new(built)),
    )
}

impl DSCompiler {
    /// value_compiler is the (parameters - 1, order) compiler (None if parameters == 0),
    /// derivative_compiler is the (parameters, order - 1) compiler (None if order == 0)
    fn new(
        parameters: usize,
        order: usize,
        value_compiler: Option<&DSCompiler>,
        derivative_compiler: Option<&DSCompiler>,
    ) -> DSCompiler {
        let sizes = compile_sizes(parameters, order, value_compiler);
        let derivatives_indirection =
            compile_derivatives_indirection(parameters, value_compiler, derivative_compiler);
        let lower_indirection = compile_lower_indirection(order, value_compiler, derivative_compiler);
        let mult_indirection =
            compile_multiplication_indirection(value_compiler, derivative_compiler, &lower_indirection);
        let comp_indirection = compile_composition_indirection(
            parameters,
            order,
            value_compiler,
            derivative_compiler,
            &sizes,
            &derivatives_indirection,
        );
        DSCompiler {
            parameters,
            order,
            sizes,
            derivatives_indirection,
            lower_indirection,
            mult_indirection,
            comp_indirection,
        }
    }

    pub fn get_free_parameters(&self) -> usize {
        self.parameters
    }

    pub fn get_order(&self) -> usize {
        self.order
    }

    /// number of doubles needed to store a full derivative structure
    pub fn get_size(&self) -> usize {
        self.sizes[self.parameters][self.order]
    }

    /// slot holding the partial derivative of the given orders (one per free parameter)
    pub fn get_partial_derivative_index(&self, orders: &[usize]) -> DSResult<usize> {
        if orders.len() != self.parameters {
            return Err(DerivativeError::DimensionMismatch {
                found: orders.len(),
                expected: self.parameters,
            });
        }
        let total: usize = orders.iter().sum();
        if total > self.order {
            return Err(DerivativeError::OrderTooLarge {
                order: total,
                max: self.order,
            });
        }
        Ok(partial_derivative_index(self.parameters, self.order, &self.sizes, orders))
    }

    /// derivation orders (one per free parameter) of the partial derivative stored at index
    pub fn get_partial_derivative_orders(&self, index: usize) -> DSResult<&[usize]> {
        self.derivatives_indirection
            .get(index)
            .map(|orders| orders.as_slice())
            .ok_or(DerivativeError::OutOfRange {
                index,
                lower: 0,
                upper: self.get_size() - 1,
            })
    }

    /// operands of a binary operation must share free parameters and order
    pub fn check_compatibility(&self, other: &DSCompiler) -> DSResult<()> {
        if self.parameters != other.parameters {
            return Err(DerivativeError::DimensionMismatch {
                found: other.parameters,
                expected: self.parameters,
            });
        }
        if self.order != other.order {
            return Err(DerivativeError::DimensionMismatch {
                found: other.order,
                expected: self.order,
            });
        }
        Ok(())
    }

    pub(crate) fn derivatives_indirection(&self) -> &[Vec<usize>] {
        &self.derivatives_indirection
    }

    pub(crate) fn mult_indirection(&self) -> &[Vec<MultiplicationTerm>] {
        &self.mult_indirection
    }

    pub(crate) fn comp_indirection(&self) -> &[Vec<CompositionTerm>] {
        &self.comp_indirection
    }
}

impl fmt::Debug for DSCompiler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DSCompiler")
            .field("parameters", &self.parameters)
            .field("order", &self.order)
            .field("size", &self.get_size())
            .finish()
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////
//                                  TABLES CONSTRUCTION
/////////////////////////////////////////////////////////////////////////////////////////////////

fn compile_sizes(
    parameters: usize,
    order: usize,
    value_compiler: Option<&DSCompiler>,
) -> Vec<Vec<usize>> {
    let mut sizes = vec![vec![0; order + 1]; parameters + 1];
    match value_compiler {
        None => sizes[0].fill(1),
        Some(value) => {
            for i in 0..parameters {
                sizes[i].copy_from_slice(&value.sizes[i]);
            }
            sizes[parameters][0] = 1;
            for i in 0..order {
                sizes[parameters][i + 1] = sizes[parameters][i] + sizes[parameters - 1][i + 1];
            }
        }
    }
    sizes
}

fn compile_derivatives_indirection(
    parameters: usize,
    value_compiler: Option<&DSCompiler>,
    derivative_compiler: Option<&DSCompiler>,
) -> Vec<Vec<usize>> {
    let (Some(value), Some(derivative)) = (value_compiler, derivative_compiler) else {
        return vec![vec![0; parameters]];
    };
    let mut indirection = Vec::with_capacity(
        value.derivatives_indirection.len() + derivative.derivatives_indirection.len(),
    );
    // value part: not differentiated with respect to the last parameter
    for orders in &value.derivatives_indirection {
        let mut extended = orders.clone();
        extended.push(0);
        indirection.push(extended);
    }
    // derivative part: one more derivation with respect to the last parameter
    for orders in &derivative.derivatives_indirection {
        let mut shifted = orders.clone();
        shifted[parameters - 1] += 1;
        indirection.push(shifted);
    }
    indirection
}

fn compile_lower_indirection(
    order: usize,
    value_compiler: Option<&DSCompiler>,
    derivative_compiler: Option<&DSCompiler>,
) -> Vec<usize> {
    match (value_compiler, derivative_compiler) {
        (Some(value), Some(derivative)) if order > 1 => {
            let v_size = value.get_size();
            let mut lower = value.lower_indirection.clone();
            lower.extend(derivative.lower_indirection.iter().map(|&i| v_size + i));
            lower
        }
        _ => vec![0],
    }
}

fn compile_multiplication_indirection(
    value_compiler: Option<&DSCompiler>,
    derivative_compiler: Option<&DSCompiler>,
    lower_indirection: &[usize],
) -> Vec<Vec<MultiplicationTerm>> {
    let (Some(value), Some(derivative)) = (value_compiler, derivative_compiler) else {
        return vec![vec![MultiplicationTerm {
            coefficient: 1,
            lhs_index: 0,
            rhs_index: 0,
        }]];
    };
    let v_size = value.get_size();
    let mut mult = value.mult_indirection.clone();
    for d_row in &derivative.mult_indirection {
        // d(f g)/dx_p = f * dg/dx_p + df/dx_p * g, both truncated one order lower
        let mut row = Vec::with_capacity(2 * d_row.len());
        for term in d_row {
            row.push(MultiplicationTerm {
                coefficient: term.coefficient,
                lhs_index: lower_indirection[term.lhs_index],
                rhs_index: v_size + term.rhs_index,
            });
            row.push(MultiplicationTerm {
                coefficient: term.coefficient,
                lhs_index: v_size + term.lhs_index,
                rhs_index: lower_indirection[term.rhs_index],
            });
        }
        mult.push(combine_multiplication_terms(row));
    }
    mult
}

fn combine_multiplication_terms(row: Vec<MultiplicationTerm>) -> Vec<MultiplicationTerm> {
    let mut combined: Vec<MultiplicationTerm> = Vec::with_capacity(row.len());
    for term in row {
        match combined
            .iter_mut()
            .find(|t| t.lhs_index == term.lhs_index && t.rhs_index == term.rhs_index)
        {
            Some(existing) => existing.coefficient += term.coefficient,
            None => combined.push(term),
        }
    }
    combined
}

fn compile_composition_indirection(
    parameters: usize,
    order: usize,
    value_compiler: Option<&DSCompiler>,
    derivative_compiler: Option<&DSCompiler>,
    sizes: &[Vec<usize>],
    derivatives_indirection: &[Vec<usize>],
) -> Vec<Vec<CompositionTerm>> {
    let (Some(value), Some(derivative)) = (value_compiler, derivative_compiler) else {
        return vec![vec![CompositionTerm {
            coefficient: 1,
            f_order: 0,
            g_indices: Vec::new(),
        }]];
    };

    // the rules of the value part are reused as is
    let mut comp = value.comp_indirection.clone();

    let mut first_derivative = vec![0; parameters];
    first_derivative[parameters - 1] = 1;
    let last_parameter_index = partial_derivative_index(parameters, order, sizes, &first_derivative);

    // the rules of the derivative part are the lower order rules differentiated
    // once more with respect to the last parameter
    for d_row in &derivative.comp_indirection {
        let mut row = Vec::new();
        for term in d_row {
            // slots of the lower order layout moved to the current layout
            let converted: Vec<usize> = term
                .g_indices
                .iter()
                .map(|&g| {
                    partial_derivative_index(
                        parameters,
                        order,
                        sizes,
                        &derivative.derivatives_indirection[g],
                    )
                })
                .collect();

            // derive f_k(g(x)) -> f_(k+1)(g(x)) * dg/dx_p
            let mut derived_f = converted.clone();
            derived_f.push(last_parameter_index);
            derived_f.sort_unstable();
            row.push(CompositionTerm {
                coefficient: term.coefficient,
                f_order: term.f_order + 1,
                g_indices: derived_f,
            });

            // derive each g_l factor in turn
            for l in 0..converted.len() {
                let mut derived_g = converted.clone();
                let mut orders = derivatives_indirection[derived_g[l]].clone();
                orders[parameters - 1] += 1;
                derived_g[l] = partial_derivative_index(parameters, order, sizes, &orders);
                derived_g.sort_unstable();
                row.push(CompositionTerm {
                    coefficient: term.coefficient,
                    f_order: term.f_order,
                    g_indices: derived_g,
                });
            }
        }
        comp.push(combine_composition_terms(row));
    }
    comp
}

fn combine_composition_terms(row: Vec<CompositionTerm>) -> Vec<CompositionTerm> {
    let mut combined: Vec<CompositionTerm> = Vec::with_capacity(row.len());
    for term in row {
        match combined
            .iter_mut()
            .find(|t| t.f_order == term.f_order && t.g_indices == term.g_indices)
        {
            Some(existing) => existing.coefficient += term.coefficient,
            None => combined.push(term),
        }
    }
    combined
}

/// Kalman's theorem 2 with the recursion replaced by iteration;
/// orders must be valid (one entry per parameter, total not above order)
fn partial_derivative_index(
    parameters: usize,
    order: usize,
    sizes: &[Vec<usize>],
    orders: &[usize],
) -> usize {
    let mut index = 0;
    let mut m = order;
    for i in (0..parameters).rev() {
        // while we differentiate with respect to this parameter, skip the value part
        for _ in 0..orders[i] {
            index += sizes[i][m];
            m -= 1;
        }
    }
    index
}
