use ndarray::{ArrayD, IxDyn};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Cauchy, Distribution, Exp, Gamma, Normal, Poisson};

use super::tensor::LocalTensor;
use crate::gateway::GatewayError;
use crate::vertex::VertexKind;

fn invalid(kind: VertexKind, msg: impl std::fmt::Display) -> GatewayError {
    GatewayError::InvalidArgument(format!("{}: {}", kind, msg))
}

/// Output shape for elementwise combination of `params`.
///
/// Single-element parameters broadcast; every other parameter must agree
/// on one shape. An explicit shape overrides inference.
pub fn broadcast_shape(
    kind: VertexKind,
    params: &[ArrayD<f64>],
    explicit: Option<&[usize]>,
) -> Result<Vec<usize>, GatewayError> {
    let mut shape: Option<Vec<usize>> = explicit.map(|s| s.to_vec());
    for p in params.iter().filter(|p| p.len() != 1) {
        match &shape {
            Some(s) if s.as_slice() != p.shape() => {
                return Err(invalid(
                    kind,
                    format!("cannot broadcast {:?} to {:?}", p.shape(), s),
                ))
            }
            Some(_) => {}
            None => shape = Some(p.shape().to_vec()),
        }
    }
    Ok(shape.unwrap_or_else(|| {
        params
            .iter()
            .map(|p| p.shape().to_vec())
            .max_by_key(|s| s.len())
            .unwrap_or_default()
    }))
}

/// Scale parameters must be strictly positive.
fn positive(kind: VertexKind, name: &str, v: f64) -> Result<f64, GatewayError> {
    if v > 0.0 {
        Ok(v)
    } else {
        Err(invalid(kind, format!("{} must be positive, was {}", name, v)))
    }
}

/// Parameters laid out flat, so cell `i` of a broadcast parameter is its only cell.
pub struct Broadcast {
    flats: Vec<Vec<f64>>,
    pub shape: Vec<usize>,
}

impl Broadcast {
    pub fn new(
        kind: VertexKind,
        params: &[ArrayD<f64>],
        explicit: Option<&[usize]>,
    ) -> Result<Self, GatewayError> {
        let shape = broadcast_shape(kind, params, explicit)?;
        let flats = params.iter().map(|p| p.iter().copied().collect()).collect();
        Ok(Self { flats, shape })
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn at(&self, param: usize, i: usize) -> f64 {
        let flat = &self.flats[param];
        if flat.len() == 1 {
            flat[0]
        } else {
            flat[i]
        }
    }

    pub fn map<T>(&self, mut f: impl FnMut(usize) -> Result<T, GatewayError>) -> Result<ArrayD<T>, GatewayError> {
        let cells = (0..self.len()).map(&mut f).collect::<Result<Vec<T>, _>>()?;
        ArrayD::from_shape_vec(IxDyn(&self.shape), cells)
            .map_err(|e| GatewayError::InvalidArgument(e.to_string()))
    }
}

/// Draw one realization of a probabilistic vertex given its parameter values.
pub fn draw(
    kind: VertexKind,
    params: &[ArrayD<f64>],
    shape: Option<&[usize]>,
    rng: &mut ChaCha8Rng,
) -> Result<LocalTensor, GatewayError> {
    let b = Broadcast::new(kind, params, shape)?;
    let tensor = match kind {
        // ── Gaussian(mu, sigma) ──────────────────────────────────────
        VertexKind::Gaussian => LocalTensor::Double(b.map(|i| {
            let sigma = positive(kind, "sigma", b.at(1, i))?;
            let normal = Normal::new(b.at(0, i), sigma).map_err(|e| invalid(kind, e))?;
            Ok(normal.sample(rng))
        })?),
        // ── Uniform(min, max) ────────────────────────────────────────
        VertexKind::Uniform => LocalTensor::Double(b.map(|i| {
            let (lo, hi) = (b.at(0, i), b.at(1, i));
            if !(lo < hi) {
                return Err(invalid(kind, format!("empty range [{}, {})", lo, hi)));
            }
            Ok(lo + (hi - lo) * rng.gen::<f64>())
        })?),
        // ── Exponential(rate) ────────────────────────────────────────
        VertexKind::Exponential => LocalTensor::Double(b.map(|i| {
            let exp = Exp::new(b.at(0, i)).map_err(|e| invalid(kind, e))?;
            Ok(exp.sample(rng))
        })?),
        // ── Gamma(theta, k): theta is the scale, k the shape ─────────
        VertexKind::Gamma => LocalTensor::Double(b.map(|i| {
            let gamma = Gamma::new(b.at(1, i), b.at(0, i)).map_err(|e| invalid(kind, e))?;
            Ok(gamma.sample(rng))
        })?),
        // ── Cauchy(location, scale) ──────────────────────────────────
        VertexKind::Cauchy => LocalTensor::Double(b.map(|i| {
            let scale = positive(kind, "scale", b.at(1, i))?;
            let cauchy = Cauchy::new(b.at(0, i), scale).map_err(|e| invalid(kind, e))?;
            Ok(cauchy.sample(rng))
        })?),
        // ── Poisson(mu) ──────────────────────────────────────────────
        VertexKind::Poisson => LocalTensor::Integer(b.map(|i| {
            let poisson = Poisson::new(b.at(0, i)).map_err(|e| invalid(kind, e))?;
            let k: f64 = poisson.sample(rng);
            Ok(k as i64)
        })?),
        // ── UniformInt(min, max), max exclusive ──────────────────────
        VertexKind::UniformInt => LocalTensor::Integer(b.map(|i| {
            let (lo, hi) = (b.at(0, i) as i64, b.at(1, i) as i64);
            if lo >= hi {
                return Err(invalid(kind, format!("empty range [{}, {})", lo, hi)));
            }
            Ok(rng.gen_range(lo..hi))
        })?),
        other => return Err(invalid(other, "not a probabilistic vertex")),
    };
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr0;
    use rand::SeedableRng;

    fn scalar(v: f64) -> ArrayD<f64> {
        arr0(v).into_dyn()
    }

    #[test]
    fn test_broadcast_scalars_to_explicit_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let t = draw(
            VertexKind::Gaussian,
            &[scalar(0.0), scalar(1.0)],
            Some(&[3usize, 3][..]),
            &mut rng,
        )
        .unwrap();
        assert_eq!(t.shape(), vec![3, 3]);
    }

    #[test]
    fn test_mismatched_shapes_rejected() {
        let a = ArrayD::from_elem(IxDyn(&[2]), 0.0);
        let b = ArrayD::from_elem(IxDyn(&[3]), 1.0);
        assert!(broadcast_shape(VertexKind::Gaussian, &[a, b], None).is_err());
    }

    #[test]
    fn test_uniform_int_stays_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let t = draw(VertexKind::UniformInt, &[scalar(1851.0), scalar(1963.0)], None, &mut rng)
                .unwrap();
            let LocalTensor::Integer(a) = t else {
                panic!("expected integer tensor")
            };
            let v = a.iter().next().copied().unwrap();
            assert!((1851..1963).contains(&v));
        }
    }

    #[test]
    fn test_negative_sigma_is_an_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = draw(VertexKind::Gaussian, &[scalar(0.0), scalar(-1.0)], None, &mut rng);
        assert!(matches!(err, Err(GatewayError::InvalidArgument(_))));
    }

    #[test]
    fn test_non_positive_scales_are_errors() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for (kind, scale) in [
            (VertexKind::Gaussian, 0.0),
            (VertexKind::Cauchy, -2.0),
            (VertexKind::Cauchy, 0.0),
        ] {
            let err = draw(kind, &[scalar(0.0), scalar(scale)], None, &mut rng);
            assert!(matches!(err, Err(GatewayError::InvalidArgument(ref m)) if m.contains("must be positive")));
        }
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let params = [scalar(0.0), scalar(1.0)];
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(
            draw(VertexKind::Gaussian, &params, None, &mut a).unwrap(),
            draw(VertexKind::Gaussian, &params, None, &mut b).unwrap()
        );
    }
}
