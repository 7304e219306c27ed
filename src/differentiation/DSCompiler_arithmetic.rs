//! Slice-level arithmetic kernels of the derivative structure compiler.
//!
//! Every kernel reads operand arrays laid out by the compiler and writes a
//! separate result array of the same size; operands are never modified.
//! Univariate functions are handled through `compose`: the kernel only
//! builds the array `f[0..=order]` of the function derivatives at the
//! operand value and the Faà di Bruno table does the rest.
use crate::differentiation::DSCompiler::DSCompiler;
use crate::differentiation::math_utils::{self, factorial, ieee_remainder, rint};

impl DSCompiler {
    ////////////////////////////////////////////////////////////////////////////////////////////
    //                                   LINEAR OPERATIONS
    ////////////////////////////////////////////////////////////////////////////////////////////

    pub fn add(&self, lhs: &[f64], rhs: &[f64], result: &mut [f64]) {
        for ((r, l), x) in result.iter_mut().zip(lhs).zip(rhs) {
            *r = l + x;
        }
    }

    pub fn subtract(&self, lhs: &[f64], rhs: &[f64], result: &mut [f64]) {
        for ((r, l), x) in result.iter_mut().zip(lhs).zip(rhs) {
            *r = l - x;
        }
    }

    /// Σ coefficients[j] * operands[j], each slot computed with an accurate dot product
    pub fn linear_combination(&self, coefficients: &[f64], operands: &[&[f64]], result: &mut [f64]) {
        let mut column = vec![0.0; operands.len()];
        for (i, r) in result.iter_mut().enumerate() {
            for (c, operand) in column.iter_mut().zip(operands) {
                *c = operand[i];
            }
            *r = math_utils::linear_combination(coefficients, &column);
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////
    //                                MULTIPLICATIVE OPERATIONS
    ////////////////////////////////////////////////////////////////////////////////////////////

    /// generalized Leibniz rule
    pub fn multiply(&self, lhs: &[f64], rhs: &[f64], result: &mut [f64]) {
        for (r, row) in result.iter_mut().zip(self.mult_indirection()) {
            *r = row
                .iter()
                .map(|term| term.coefficient as f64 * lhs[term.lhs_index] * rhs[term.rhs_index])
                .sum();
        }
    }

    /// 1/x composed with the operand: d^n(1/x)/dx^n = (-1)^n n! / x^(n+1)
    pub fn reciprocal(&self, operand: &[f64], result: &mut [f64]) {
        self.pow_int(operand, -1, result);
    }

    pub fn divide(&self, lhs: &[f64], rhs: &[f64], result: &mut [f64]) {
        let mut reciprocal = vec![0.0; self.get_size()];
        self.reciprocal(rhs, &mut reciprocal);
        self.multiply(lhs, &reciprocal, result);
    }

    /// IEEE remainder; with lhs % rhs = lhs - k rhs the derivatives are those of lhs - k rhs
    pub fn remainder(&self, lhs: &[f64], rhs: &[f64], result: &mut [f64]) {
        let rem = ieee_remainder(lhs[0], rhs[0]);
        let k = rint((lhs[0] - rem) / rhs[0]);
        result[0] = rem;
        for i in 1..result.len() {
            result[i] = lhs[i] - k * rhs[i];
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////
    //                                   POWERS AND ROOTS
    ////////////////////////////////////////////////////////////////////////////////////////////

    /// x^n: [x^n, n x^(n-1), n(n-1) x^(n-2), ...]
    pub fn pow_int(&self, operand: &[f64], n: i32, result: &mut [f64]) {
        if n == 0 {
            result[0] = 1.0;
            result[1..].fill(0.0);
            return;
        }

        let order = self.get_order();
        let x = operand[0];
        let mut function = vec![0.0; order + 1];
        if n > 0 {
            // derivatives beyond n vanish
            let max_order = order.min(n as usize);
            let mut xk = x.powi(n - max_order as i32);
            for i in (1..=max_order).rev() {
                function[i] = xk;
                xk *= x;
            }
            function[0] = xk;
        } else {
            let inv = 1.0 / x;
            let mut xk = inv.powf(-f64::from(n));
            for f in function.iter_mut() {
                *f = xk;
                xk *= inv;
            }
        }

        let mut coefficient = f64::from(n);
        for (i, f) in function.iter_mut().enumerate().skip(1) {
            *f *= coefficient;
            coefficient *= f64::from(n) - i as f64;
        }
        self.compose(operand, &function, result);
    }

    /// a^x for a constant base a
    pub fn pow_base(&self, a: f64, operand: &[f64], result: &mut [f64]) {
        let x = operand[0];
        let mut function = vec![0.0; self.get_order() + 1];
        if a == 0.0 {
            if x == 0.0 {
                // 0^0: value 1, alternating infinite derivatives
                function[0] = 1.0;
                let mut infinity = f64::INFINITY;
                for f in function.iter_mut().skip(1) {
                    infinity = -infinity;
                    *f = infinity;
                }
            } else if x < 0.0 {
                function.fill(f64::NAN);
            }
        } else {
            function[0] = a.powf(x);
            let ln_a = a.ln();
            for i in 1..function.len() {
                function[i] = ln_a * function[i - 1];
            }
        }
        self.compose(operand, &function, result);
    }

    /// x^p for a real exponent, through exp(p ln(x))
    pub fn pow_real(&self, operand: &[f64], p: f64, result: &mut [f64]) {
        let mut ln_x = vec![0.0; self.get_size()];
        self.ln(operand, &mut ln_x);
        for v in ln_x.iter_mut() {
            *v *= p;
        }
        self.exp(&ln_x, result);
    }

    /// x^e for a structure exponent, through exp(e ln(x))
    pub fn pow_structure(&self, operand: &[f64], exponent: &[f64], result: &mut [f64]) {
        let mut ln_x = vec![0.0; self.get_size()];
        self.ln(operand, &mut ln_x);
        let mut e_ln_x = vec![0.0; self.get_size()];
        self.multiply(exponent, &ln_x, &mut e_ln_x);
        self.exp(&e_ln_x, result);
    }

    /// n-th root: [x^(1/n), (1/n) x^(1/n - 1), (1-n)/n^2 x^(1/n - 2), ...];
    /// n must be positive
    pub fn root_n(&self, operand: &[f64], n: usize, result: &mut [f64]) {
        let x = operand[0];
        let mut function = vec![0.0; self.get_order() + 1];
        let mut xk = match n {
            2 => {
                function[0] = x.sqrt();
                0.5 / function[0]
            }
            3 => {
                function[0] = x.cbrt();
                1.0 / (3.0 * function[0] * function[0])
            }
            _ => {
                function[0] = if n % 2 == 1 && x < 0.0 {
                    -(-x).powf(1.0 / n as f64)
                } else {
                    x.powf(1.0 / n as f64)
                };
                1.0 / (n as f64 * function[0].powi(n as i32 - 1))
            }
        };
        let n_reciprocal = 1.0 / n as f64;
        let x_reciprocal = 1.0 / x;
        for (i, f) in function.iter_mut().enumerate().skip(1) {
            *f = xk;
            xk *= x_reciprocal * (n_reciprocal - i as f64);
        }
        self.compose(operand, &function, result);
    }

    ////////////////////////////////////////////////////////////////////////////////////////////
    //                                COMPOSITION AND EVALUATION
    ////////////////////////////////////////////////////////////////////////////////////////////

    /// Faà di Bruno: result = f(operand) where f[k] is the k-th derivative of f at operand[0]
    pub fn compose(&self, operand: &[f64], f: &[f64], result: &mut [f64]) {
        for (r, row) in result.iter_mut().zip(self.comp_indirection()) {
            *r = row
                .iter()
                .map(|term| {
                    term.g_indices
                        .iter()
                        .fold(term.coefficient as f64 * f[term.f_order], |product, &g| {
                            product * operand[g]
                        })
                })
                .sum();
        }
    }

    /// Σ ds[k] / k! * delta^k over all stored multi-indices k
    pub fn taylor(&self, ds: &[f64], delta: &[f64]) -> f64 {
        let mut value = 0.0;
        // smallest terms first
        for (i, orders) in self.derivatives_indirection().iter().enumerate().rev() {
            let mut term = ds[i];
            for (k, &o) in orders.iter().enumerate() {
                if o > 0 {
                    term *= delta[k].powi(o as i32) / factorial(o);
                }
            }
            value += term;
        }
        value
    }
}
