pub mod rivers;
