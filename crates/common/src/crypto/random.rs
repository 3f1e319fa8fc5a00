use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, NonZeroScalar, Scalar};

use super::error::CryptoError;

/// Draw a scalar uniformly from `[1, q-1]` using the operating system CSPRNG.
///
/// Rejection sampling over 32 random bytes: candidates `>= q` or equal to
/// zero are discarded. If the OS source fails there is no fallback.
pub fn random_nonzero_scalar() -> Result<NonZeroScalar, CryptoError> {
    loop {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::Entropy(e.to_string()))?;

        let candidate = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(bytes)))
            .and_then(|s| Option::<NonZeroScalar>::from(NonZeroScalar::new(s)));
        if let Some(scalar) = candidate {
            return Ok(scalar);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_random_scalars_are_distinct() {
        let a = random_nonzero_scalar().unwrap();
        let b = random_nonzero_scalar().unwrap();
        assert_ne!(a.to_repr(), b.to_repr());
    }

    #[test]
    fn test_random_scalar_never_zero() {
        for _ in 0..256 {
            let s = random_nonzero_scalar().unwrap();
            assert_ne!(*s.as_ref(), Scalar::ZERO);
        }
    }
}
