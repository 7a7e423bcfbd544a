/// Reed-Solomon over GF(256) as QR uses it: generator roots at
/// alpha^0 .. alpha^(t-1), parity by polynomial remainder, decode by
/// syndromes, the Euclidean key equation, Chien search and Forney's
/// formula. No erasure support.

use crate::error::QrError;
use crate::galois::{self, Poly};

/// g(x) = (x - a^0)(x - a^1) ... (x - a^(t-1))
pub fn generator_poly(error_words: usize) -> Poly {
    let mut g = Poly::from_coeffs(&[1]);
    for i in 0..error_words {
        g = g.mul(&Poly::from_coeffs(&[galois::pow_a(i), 1]));
    }
    g
}

/// parity of I(x) = data * x^t, i.e. I mod g
pub fn calc_parity(shifted_data: &Poly, gen: &Poly) -> Poly {
    shifted_data.modulo(gen)
}

/// Correct up to floor(t/2) symbol errors in place. Returns the number of
/// corrected symbols, or `Uncorrectable` when the located error count does
/// not match the degree of the locator -- never a silently wrong codeword.
pub fn fix_errors(codeword: &mut Poly, codeword_len: usize, error_words: usize) -> Result<usize, QrError> {
    // syndromes S_i = R(a^i)
    let mut s = Poly::zero(error_words.saturating_sub(1));
    for i in 0..error_words {
        s.set_coeff(i, codeword.eval(galois::pow_a(i)));
    }

    if s.is_zero() {
        return Ok(0);
    }

    let z = Poly::monomial(error_words);
    let (sigma, omega) = galois::solve_key_equation(&z, &s);

    // denom(x) = x * sigma'(x), so the Forney value is omega(X) / denom(X)
    let denom = Poly::monomial(1).mul(&sigma.derivative());

    let mut num_errors = 0;
    for pos in 0..codeword_len {
        let x_inv = galois::pow_a(galois::GF_MAX_EXP - pos % galois::GF_MAX_EXP);
        if sigma.eval(x_inv) != 0 {
            continue;
        }

        let d = denom.eval(x_inv);
        if d == 0 {
            return Err(QrError::Uncorrectable);
        }
        let magnitude = galois::div(omega.eval(x_inv), d);
        codeword.set_coeff(pos, codeword.coeff(pos) ^ magnitude);
        num_errors += 1;
    }

    if num_errors != sigma.degree() {
        return Err(QrError::Uncorrectable);
    }

    Ok(num_errors)
}

//-------------------------------------------------------------------
// TESTS
//-------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn encode(data: &[u8], t: usize) -> Vec<u8> {
        let g = generator_poly(t);
        let k = data.len();
        // data word i becomes the coefficient of x^(t + k - 1 - i)
        let mut shifted = Poly::zero(t + k - 1);
        for (i, &d) in data.iter().enumerate() {
            shifted.set_coeff(t + k - 1 - i, d);
        }
        let parity = calc_parity(&shifted, &g);

        let mut out = data.to_vec();
        for i in (0..t).rev() {
            out.push(parity.coeff(i));
        }
        out
    }

    fn as_poly(codeword: &[u8]) -> Poly {
        let n = codeword.len();
        let mut r = Poly::zero(n - 1);
        for (i, &w) in codeword.iter().enumerate() {
            r.set_coeff(n - 1 - i, w);
        }
        r
    }

    #[test]
    fn test_parity_makes_all_syndromes_vanish() {
        let data = [
            0x20, 0x5B, 0x0B, 0x78, 0xD1, 0x72, 0xDC, 0x4D, 0x43, 0x40, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11,
        ];
        let code = encode(&data, 10);
        let r = as_poly(&code);
        for i in 0..10 {
            assert_eq!(r.eval(crate::galois::pow_a(i)), 0, "syndrome {} not zero", i);
        }
    }

    #[test]
    fn test_no_error_is_zero_fixes() {
        let code = encode(b"qrloom test data", 8);
        let mut r = as_poly(&code);
        assert_eq!(fix_errors(&mut r, code.len(), 8), Ok(0));
    }

    #[test]
    fn test_corrects_up_to_half_t() {
        let code = encode(b"some payload words here", 16);
        let n = code.len();

        let mut r = as_poly(&code);
        // clobber 8 symbols, exactly floor(16/2)
        for i in [0usize, 3, 4, 9, 11, 17, 20, 22].iter() {
            r.set_coeff(n - 1 - i, r.coeff(n - 1 - i) ^ 0x5A);
        }
        assert_eq!(fix_errors(&mut r, n, 16), Ok(8));
        assert_eq!(r, as_poly(&code));
    }

    #[test]
    fn test_overload_reports_uncorrectable() {
        let code = encode(b"some payload words here", 8);
        let n = code.len();

        let mut r = as_poly(&code);
        for i in 0..5 {
            r.set_coeff(n - 1 - i * 2, r.coeff(n - 1 - i * 2) ^ (0x21 + i as u8));
        }
        match fix_errors(&mut r, n, 8) {
            Err(QrError::Uncorrectable) => {}
            Ok(fixed) => {
                // a lucky alias may decode, but it must then be a valid codeword
                assert!(fixed <= 4);
                let mut s_ok = true;
                for i in 0..8 {
                    if r.eval(crate::galois::pow_a(i)) != 0 {
                        s_ok = false;
                    }
                }
                assert!(s_ok);
            }
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
}
