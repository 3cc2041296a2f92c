//! Common items related to Genetic Programming.
//!
//! Programs are expression trees over two inputs `a` and `b`. Each node holds a `Symbol`:
//! either a `Terminal` (an input or a constant) or an `Operator` whose arity determines how
//! many operands it takes.
//!
//! - `op`: the operator registry and its evaluation rules.
//! - `memory`: the register read and written by the `read`/`write` operators.
//! - `expr`: the tree itself.
//! - `gen`: random tree growth.
//! - `mutate`: subtree deletion, subtree growth and crossover.

pub mod expr;
pub mod gen;
pub mod memory;
pub mod mutate;
pub mod op;
