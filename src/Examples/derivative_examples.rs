// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_snake_case)]

use crate::Utils::logger::init_logger;
use crate::differentiation::DS_field::{RealFieldElement, polynomial_value};
use crate::differentiation::derivative_structure::DerivativeStructure;
use crate::differentiation::errors::DSResult;
use log::info;

/// f(x, y) = x^2 y + sin(y) and all its derivatives up to order 2
pub fn two_variables_example() -> DSResult<DerivativeStructure> {
    let x = DerivativeStructure::variable(2, 2, 0, 2.0)?;
    let y = DerivativeStructure::variable(2, 2, 1, 0.5)?;
    let x_squared_y = x.pow_int(2).multiply(&y)?;
    x_squared_y.add(&y.sin())
}

/// f(x, y, z) = x y (x y + z) expanded around (0.3, 0.4, 0.5) and evaluated at a shifted point
pub fn taylor_example(order: usize) -> DSResult<(f64, f64)> {
    let x = DerivativeStructure::variable(3, order, 0, 0.3)?;
    let y = DerivativeStructure::variable(3, order, 1, 0.4)?;
    let z = DerivativeStructure::variable(3, order, 2, 0.5)?;
    let xy = &x * &y;
    let f = &xy * &(&xy + &z);
    let delta = [0.1, 0.1, 0.1];
    let expanded = f.taylor(&delta)?;
    let direct = (0.3 + delta[0]) * (0.4 + delta[1]) * ((0.3 + delta[0]) * (0.4 + delta[1]) + (0.5 + delta[2]));
    Ok((expanded, direct))
}

/// the same Gaussian evaluated on plain doubles and on a derivative structure
fn gaussian<T: RealFieldElement>(x: &T) -> T {
    (-(x.clone() * x.clone()) * 0.5).exp()
}

#[allow(dead_code)]
pub fn derivative_examples(example: usize) {
    match example {
        0 => {
            // MULTIVARIATE FUNCTION
            let f = two_variables_example().unwrap();
            println!("f = {}", f);
            println!("df/dx = {}", f.get_partial_derivative(&[1, 0]).unwrap());
            println!("df/dy = {}", f.get_partial_derivative(&[0, 1]).unwrap());
            println!("d2f/dxdy = {}", f.get_partial_derivative(&[1, 1]).unwrap());
            println!("d2f/dy2 = {}", f.get_partial_derivative(&[0, 2]).unwrap());
        }
        1 => {
            // UNIVARIATE FUNCTION, HIGH ORDER
            let x = DerivativeStructure::single_variable(6, 0.5);
            let f = x.exp().multiply(&x.atan()).unwrap();
            for k in 0..=6 {
                println!("d^{}f/dx^{} = {}", k, k, f.get_partial_derivative(&[k]).unwrap());
            }
        }
        2 => {
            // TAYLOR EXPANSION
            for order in 1..=5 {
                let (expanded, direct) = taylor_example(order).unwrap();
                println!(
                    "order {}: taylor {}, direct {}, error {:e}",
                    order,
                    expanded,
                    direct,
                    (expanded - direct).abs()
                );
            }
        }
        3 => {
            // NO OVERFLOW IN HYPOT
            let x = DerivativeStructure::variable(2, 1, 0, 3.0e250).unwrap();
            let y = DerivativeStructure::variable(2, 1, 1, -4.0e250).unwrap();
            println!("hypot = {}", x.hypot(&y).unwrap());
            println!("naive = {}", (&(&x * &x) + &(&y * &y)).sqrt());
        }
        4 => {
            // GENERIC CODE ON DOUBLES AND STRUCTURES
            let x = DerivativeStructure::single_variable(2, 0.7);
            println!("gaussian(0.7) = {}", gaussian(&0.7_f64));
            println!("gaussian(x) = {}", gaussian(&x));
            let coefficients = [1.0, -3.0, 0.0, 2.0];
            println!("p(x) = {}", polynomial_value(&coefficients, &x));
        }
        5 => {
            // LOGGING OF COMPILER TABLES
            init_logger(Some("debug".to_string()), None);
            let big = DerivativeStructure::variable(8, 6, 3, 1.0).unwrap();
            info!("structure with {} slots", big.derivatives().len());
            let f = big.sin().ln_1p();
            info!("f value {}", f.get_value());
        }
        _ => {
            println!("no such example");
        }
    }
}
