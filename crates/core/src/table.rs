//! Trellis output table construction.
//!
//! A convolutional code with `rate` generator polynomials and an `order`-bit
//! shift register is fully described by one row per register state: the
//! `rate` output bits the encoder emits when the register holds that state.
//!
//! Polynomials are tap masks over the register. Bit 0 of both the register
//! and the mask is the newest input bit. Output bit `j` of a row is the
//! parity of `state & polynomials[j]`.

use crate::convolutional::{MAX_ORDER, MAX_RATE, MIN_RATE};
use crate::error::{CodeError, Result};

/// Generator polynomial tap mask.
pub type Polynomial = u32;

/// Shift register contents; also the state counter type.
pub type ShiftRegister = u32;

/// Rate 1/2, order 3 (the textbook 7, 5 code).
pub const R12_K3: [Polynomial; 2] = [0o7, 0o5];

/// Rate 1/2, order 5.
pub const R12_K5: [Polynomial; 2] = [0o23, 0o35];

/// Rate 1/2, order 7 (171, 133), used by CCSDS, 802.11 and DVB-S.
pub const R12_K7: [Polynomial; 2] = [0o171, 0o133];

/// Rate 1/3, order 7.
pub const R13_K7: [Polynomial; 3] = [0o171, 0o133, 0o165];

/// Fill a trellis table for `rate` polynomials over an `order`-bit register.
///
/// # Errors
/// - `CodeError::InvalidOrder` unless `1 <= order <= MAX_ORDER`
/// - `CodeError::InvalidRate` unless `MIN_RATE <= rate <= MAX_RATE`
/// - `CodeError::PolynomialCount` unless there is exactly one polynomial per output bit
/// - `CodeError::PolynomialTooWide` if a polynomial taps past bit `order - 1`
/// - `CodeError::Allocation` if the table cannot be allocated
pub fn fill_table(rate: usize, order: usize, polynomials: &[Polynomial]) -> Result<Vec<u32>> {
    if order == 0 || order > MAX_ORDER {
        return Err(CodeError::InvalidOrder {
            order,
            max: MAX_ORDER,
        }
        .into());
    }
    if !(MIN_RATE..=MAX_RATE).contains(&rate) {
        return Err(CodeError::InvalidRate {
            rate,
            min: MIN_RATE,
            max: MAX_RATE,
        }
        .into());
    }
    if polynomials.len() != rate {
        return Err(CodeError::PolynomialCount {
            expected: rate,
            actual: polynomials.len(),
        }
        .into());
    }
    if let Some(&polynomial) = polynomials
        .iter()
        .find(|&&p| p >> order != 0)
    {
        return Err(CodeError::PolynomialTooWide { polynomial, order }.into());
    }

    let num_states = 1usize << order;
    let mut table = Vec::new();
    table
        .try_reserve_exact(num_states)
        .map_err(|_| CodeError::Allocation { what: "trellis table" })?;

    for state in 0..num_states as ShiftRegister {
        let row = polynomials
            .iter()
            .enumerate()
            .fold(0u32, |row, (j, &poly)| row | (parity(state & poly) << j));
        table.push(row);
    }

    Ok(table)
}

/// 1 if `x` has an odd number of set bits.
#[inline]
pub fn parity(x: u32) -> u32 {
    x.count_ones() & 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_fill_table_k3() {
        let table = fill_table(2, 3, &R12_K3).unwrap();
        assert_eq!(table.len(), 8);
        // state 0b001: 7 -> parity(1)=1, 5 -> parity(1)=1
        assert_eq!(table[0b001], 0b11);
        // state 0b010: 7 -> 1, 5 -> 0
        assert_eq!(table[0b010], 0b01);
        // state 0b110: 7 -> parity(0b110)=0, 5 -> parity(0b100)=1
        assert_eq!(table[0b110], 0b10);
        assert_eq!(table[0], 0);
    }

    #[test]
    fn test_rows_fit_rate() {
        let table = fill_table(3, 7, &R13_K7).unwrap();
        assert_eq!(table.len(), 128);
        assert!(table.iter().all(|&row| row < 8));
    }

    #[test]
    fn test_polynomial_count_mismatch() {
        let err = fill_table(3, 7, &R12_K7).unwrap_err();
        assert!(matches!(
            err,
            Error::Code(CodeError::PolynomialCount {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_polynomial_too_wide() {
        let err = fill_table(2, 5, &R12_K7).unwrap_err();
        assert!(matches!(
            err,
            Error::Code(CodeError::PolynomialTooWide { polynomial: 0o171, order: 5 })
        ));
    }

    #[test]
    fn test_order_out_of_range() {
        for order in [0, 32, 40, 64, usize::MAX] {
            let err = fill_table(2, order, &[1, 1]).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::Code(CodeError::InvalidOrder { max: MAX_ORDER, .. })
                ),
                "order {order}: {err:?}"
            );
        }
    }

    #[test]
    fn test_rate_out_of_range() {
        let polys = [1; 40];
        for rate in [0, 1, 9, 32, 40] {
            let err = fill_table(rate, 3, &polys[..rate]).unwrap_err();
            assert!(
                matches!(err, Error::Code(CodeError::InvalidRate { .. })),
                "rate {rate}: {err:?}"
            );
        }
    }

    #[test]
    fn test_parity() {
        assert_eq!(parity(0), 0);
        assert_eq!(parity(0b1011), 1);
        assert_eq!(parity(0b1001), 0);
    }
}
