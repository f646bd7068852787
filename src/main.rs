#![allow(non_snake_case)]
pub mod Examples;
pub mod Utils;
pub mod purification;
pub mod symbolic;

use crate::Examples::purification_examples::purification_examples;

fn main() {
    let example = 1;
    match example {
        0 => {
            // TERM DECOMPOSITION
            purification_examples(0);
        }
        1 => {
            // 2D PURIFICATION WITH THE FREE FUNCTION API
            purification_examples(1);
        }
        2 => {
            // 3D PURIFICATION WITH THE STRUCT API, PARALLEL DISPATCH
            purification_examples(2);
        }
        3 => {
            // TASK FILE AND CSV DRIVEN RUN
            purification_examples(3);
        }
        _ => {
            println!("example not found");
        }
    }
    //_________________________________________________
}
