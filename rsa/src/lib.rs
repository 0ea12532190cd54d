pub mod attacks;
pub mod number_theory;
pub mod oracle;
pub mod padding;
pub mod primality;
pub mod rsa;
