/// Arithmetic over GF(256) with the QR primitive polynomial
/// x^8 + x^4 + x^3 + x^2 + 1 (0x11D), plus the polynomial algebra the
/// Reed-Solomon codec is built from. Polynomials store the coefficient of
/// x^i at index i.

use lazy_static::lazy_static;

pub type Gf = u8;

pub const GF_MAX_EXP: usize = 255;
const PRIMITIVE: u16 = 0x11D;

struct GfTables {
    exp: [Gf; 256],
    log: [u8; 256],
}

lazy_static! {
    static ref TABLES: GfTables = {
        let mut exp = [0u8; 256];
        let mut log = [0u8; 256];
        let mut v: u16 = 1;
        for i in 0..255 {
            exp[i] = v as Gf;
            log[v as usize] = i as u8;
            v <<= 1;
            if v & 0x100 != 0 {
                v ^= PRIMITIVE;
            }
        }
        exp[255] = exp[0];
        // log[0] stays 0 but is never consulted
        GfTables { exp, log }
    };
}

pub fn add(a: Gf, b: Gf) -> Gf {
    a ^ b
}

pub fn mul(a: Gf, b: Gf) -> Gf {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = &*TABLES;
    t.exp[(t.log[a as usize] as usize + t.log[b as usize] as usize) % GF_MAX_EXP]
}

pub fn div(a: Gf, b: Gf) -> Gf {
    debug_assert!(b != 0, "division by zero in GF(256)");
    if a == 0 || b == 0 {
        return 0;
    }
    let t = &*TABLES;
    t.exp[(t.log[a as usize] as usize + GF_MAX_EXP - t.log[b as usize] as usize) % GF_MAX_EXP]
}

/// alpha^exp, exponent taken mod 255
pub fn pow_a(exp: usize) -> Gf {
    TABLES.exp[exp % GF_MAX_EXP]
}

pub fn log_a(v: Gf) -> u8 {
    debug_assert!(v != 0);
    TABLES.log[v as usize]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poly {
    coeffs: Vec<Gf>,
}

impl Poly {
    pub fn zero(degree: usize) -> Poly {
        Poly { coeffs: vec![0; degree + 1] }
    }

    pub fn from_coeffs(coeffs: &[Gf]) -> Poly {
        Poly { coeffs: coeffs.to_vec() }
    }

    /// x^n
    pub fn monomial(degree: usize) -> Poly {
        let mut p = Poly::zero(degree);
        p.coeffs[degree] = 1;
        p
    }

    pub fn coeff(&self, i: usize) -> Gf {
        self.coeffs.get(i).copied().unwrap_or(0)
    }

    pub fn set_coeff(&mut self, i: usize, v: Gf) {
        if i >= self.coeffs.len() {
            self.coeffs.resize(i + 1, 0);
        }
        self.coeffs[i] = v;
    }

    /// highest index with a non-zero coefficient; 0 for the zero polynomial
    pub fn degree(&self) -> usize {
        for i in (0..self.coeffs.len()).rev() {
            if self.coeffs[i] != 0 {
                return i;
            }
        }
        0
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    pub fn add(&self, b: &Poly) -> Poly {
        let n = self.coeffs.len().max(b.coeffs.len());
        let mut out = Poly::zero(n.saturating_sub(1));
        for i in 0..n {
            out.coeffs[i] = self.coeff(i) ^ b.coeff(i);
        }
        out
    }

    pub fn mul(&self, b: &Poly) -> Poly {
        let mut out = Poly::zero(self.degree() + b.degree());
        for i in 0..=self.degree() {
            if self.coeff(i) == 0 {
                continue;
            }
            for j in 0..=b.degree() {
                let v = mul(self.coeff(i), b.coeff(j));
                out.coeffs[i + j] ^= v;
            }
        }
        out
    }

    /// scale every coefficient by 1/c; a zero scale leaves the polynomial
    /// untouched so the caller's degree checks can reject the result
    pub fn div_scalar(&self, c: Gf) -> Poly {
        if c == 0 {
            return self.clone();
        }
        let mut out = self.clone();
        for v in out.coeffs.iter_mut() {
            *v = div(*v, c);
        }
        out
    }

    /// long division, returns (quotient, remainder)
    pub fn divmod(&self, b: &Poly) -> (Poly, Poly) {
        let db = b.degree();
        let lead = b.coeff(db);
        debug_assert!(lead != 0, "division by zero polynomial");

        let mut rem = self.clone();
        let mut quot = Poly::zero(self.degree());
        let mut dr = rem.degree();
        while dr >= db && !rem.is_zero() {
            let factor = div(rem.coeff(dr), lead);
            let shift = dr - db;
            quot.set_coeff(shift, factor);
            for i in 0..=db {
                let v = mul(b.coeff(i), factor);
                let c = rem.coeff(i + shift) ^ v;
                rem.set_coeff(i + shift, c);
            }
            if dr == 0 {
                break;
            }
            dr = rem.degree();
        }
        (quot, rem)
    }

    pub fn modulo(&self, b: &Poly) -> Poly {
        self.divmod(b).1
    }

    /// formal derivative; in GF(2^8) even-power terms vanish
    pub fn derivative(&self) -> Poly {
        let d = self.degree();
        let mut out = Poly::zero(d.saturating_sub(1));
        for i in 1..=d {
            if i % 2 == 1 {
                out.set_coeff(i - 1, self.coeff(i));
            }
        }
        out
    }

    /// Horner evaluation at x
    pub fn eval(&self, x: Gf) -> Gf {
        let mut acc = 0;
        for i in (0..=self.degree()).rev() {
            acc = mul(acc, x) ^ self.coeff(i);
        }
        acc
    }
}

/// Extended Euclid on (a, b) until deg(n) < deg(y), yielding the error
/// locator sigma and the error evaluator omega of the key equation
/// sigma * S = omega (mod x^t). Both are normalized by the constant term
/// of sigma.
pub fn solve_key_equation(a: &Poly, b: &Poly) -> (Poly, Poly) {
    let (mut m, mut n) = if a.degree() < b.degree() {
        (b.clone(), a.clone())
    } else {
        (a.clone(), b.clone())
    };

    let mut x = Poly::zero(0);
    let mut y = Poly::from_coeffs(&[1]);

    while !n.is_zero() && n.degree() >= y.degree() {
        let (q, r) = m.divmod(&n);
        let z = q.mul(&y).add(&x);
        x = y;
        y = z;
        m = n;
        n = r;
    }

    let h = y.coeff(0);
    (y.div_scalar(h), n.div_scalar(h))
}

//-------------------------------------------------------------------
// TESTS
//-------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_basics() {
        assert_eq!(mul(0, 37), 0);
        assert_eq!(mul(1, 37), 37);
        assert_eq!(mul(2, 0x80), 0x1D); // wraps through the primitive poly
        assert_eq!(pow_a(0), 1);
        assert_eq!(pow_a(1), 2);
        assert_eq!(pow_a(255), 1);
        for v in 1..=255u8 {
            assert_eq!(div(mul(v, 77), 77), v);
        }
    }

    #[test]
    fn test_poly_mul_divmod() {
        // (x + 1)(x + 2) = x^2 + 3x + 2
        let a = Poly::from_coeffs(&[1, 1]);
        let b = Poly::from_coeffs(&[2, 1]);
        let p = a.mul(&b);
        assert_eq!(p, Poly::from_coeffs(&[2, 3, 1]));

        let (q, r) = p.divmod(&a);
        assert_eq!(q, Poly::from_coeffs(&[2, 1]));
        assert!(r.is_zero());
    }

    #[test]
    fn test_eval_roots() {
        // roots of (x - a^0)(x - a^1)
        let g = Poly::from_coeffs(&[pow_a(0), 1]).mul(&Poly::from_coeffs(&[pow_a(1), 1]));
        assert_eq!(g.eval(pow_a(0)), 0);
        assert_eq!(g.eval(pow_a(1)), 0);
        assert_ne!(g.eval(pow_a(2)), 0);
    }

    #[test]
    fn test_derivative_drops_even_terms() {
        let p = Poly::from_coeffs(&[5, 7, 11, 13]);
        let d = p.derivative();
        assert_eq!(d.coeff(0), 7);
        assert_eq!(d.coeff(1), 0);
        assert_eq!(d.coeff(2), 13);
    }
}
