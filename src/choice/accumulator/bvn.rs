//! Univariate and bivariate standard normal probabilities.
//!
//! [`norm_cdf`] goes through `statrs`' complementary error function so the
//! lower tail keeps relative precision. [`bvn_upper`] is Genz's BVNU
//! algorithm (Gauss–Legendre quadrature of Drezner–Wesolowsky's formula,
//! with a separate expansion for `|r| ≥ 0.925`); absolute error is below
//! `1e-14` over the whole domain.
use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

/// Standard normal CDF `Φ(x) = ½·erfc(−x/√2)`.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

const GL6_W: [f64; 3] = [0.171_324_492_379_170_5, 0.360_761_573_048_138_4, 0.467_913_934_572_690_4];
const GL6_X: [f64; 3] = [0.932_469_514_203_152_2, 0.661_209_386_466_264_7, 0.238_619_186_083_197_0];

const GL12_W: [f64; 6] = [
    0.047_175_336_386_511_77,
    0.106_939_325_995_318_3,
    0.160_078_328_543_346_4,
    0.203_167_426_723_065_9,
    0.233_492_536_538_354_7,
    0.249_147_045_813_402_9,
];
const GL12_X: [f64; 6] = [
    0.981_560_634_246_719_1,
    0.904_117_256_370_475_0,
    0.769_902_674_194_305_0,
    0.587_317_954_286_617_1,
    0.367_831_498_998_180_2,
    0.125_233_408_511_469_2,
];

const GL20_W: [f64; 10] = [
    0.017_614_007_139_152_12,
    0.040_601_429_800_386_94,
    0.062_672_048_334_109_06,
    0.083_276_741_576_704_75,
    0.101_930_119_817_240_4,
    0.118_194_531_961_518_4,
    0.131_688_638_449_176_6,
    0.142_096_109_318_382_1,
    0.149_172_986_472_603_7,
    0.152_753_387_130_725_9,
];
const GL20_X: [f64; 10] = [
    0.993_128_599_185_094_9,
    0.963_971_927_277_913_8,
    0.912_234_428_251_325_9,
    0.839_116_971_822_218_8,
    0.746_331_906_460_150_8,
    0.636_053_680_726_515_0,
    0.510_867_001_950_827_1,
    0.373_706_088_715_419_6,
    0.227_785_851_141_645_1,
    0.076_526_521_133_497_33,
];

/// `P(X > h, Y > k)` for standard bivariate normal `(X, Y)` with
/// correlation `r ∈ [−1, 1]`. Result clamped to `[0, 1]`.
pub fn bvn_upper(h: f64, k: f64, r: f64) -> f64 {
    if h == f64::INFINITY || k == f64::INFINITY {
        return 0.0;
    }
    if h == f64::NEG_INFINITY {
        return if k == f64::NEG_INFINITY { 1.0 } else { norm_cdf(-k) };
    }
    if k == f64::NEG_INFINITY {
        return norm_cdf(-h);
    }
    if r == 0.0 {
        return norm_cdf(-h) * norm_cdf(-k);
    }

    let (w, x): (&[f64], &[f64]) = if r.abs() < 0.3 {
        (&GL6_W, &GL6_X)
    } else if r.abs() < 0.75 {
        (&GL12_W, &GL12_X)
    } else {
        (&GL20_W, &GL20_X)
    };
    // Nodes mapped from (−1, 1) to (0, 2): both halves share the weights.
    let nodes = || x.iter().zip(w).flat_map(|(xi, wi)| [(1.0 - xi, *wi), (1.0 + xi, *wi)]);

    let tp = 2.0 * PI;
    let mut k = k;
    let mut hk = h * k;
    let mut bvn = 0.0;

    if r.abs() < 0.925 {
        let hs = (h * h + k * k) / 2.0;
        let asr = r.asin() / 2.0;
        let sum: f64 = nodes()
            .map(|(xi, wi)| {
                let sn = (asr * xi).sin();
                wi * ((sn * hk - hs) / (1.0 - sn * sn)).exp()
            })
            .sum();
        bvn = sum * asr / tp + norm_cdf(-h) * norm_cdf(-k);
    } else {
        if r < 0.0 {
            k = -k;
            hk = -hk;
        }
        if r.abs() < 1.0 {
            let as_ = 1.0 - r * r;
            let mut a = as_.sqrt();
            let bs = (h - k) * (h - k);
            let asr = -(bs / as_ + hk) / 2.0;
            let c = (4.0 - hk) / 8.0;
            let d = (12.0 - hk) / 80.0;
            if asr > -100.0 {
                bvn = a * asr.exp() * (1.0 - c * (bs - as_) * (1.0 - d * bs) / 3.0 + c * d * as_ * as_);
            }
            if hk > -100.0 {
                let b = bs.sqrt();
                let sp = tp.sqrt() * norm_cdf(-b / a);
                bvn -= (-hk / 2.0).exp() * sp * b * (1.0 - c * bs * (1.0 - d * bs) / 3.0);
            }
            a /= 2.0;
            let sum: f64 = nodes()
                .filter_map(|(xi, wi)| {
                    let xs = (a * xi) * (a * xi);
                    let asr = -(bs / xs + hk) / 2.0;
                    if asr <= -100.0 {
                        return None;
                    }
                    let sp = 1.0 + c * xs * (1.0 + 5.0 * d * xs);
                    let rs = (1.0 - xs).sqrt();
                    let ep = (-(hk / 2.0) * xs / ((1.0 + rs) * (1.0 + rs))).exp() / rs;
                    Some(wi * asr.exp() * (sp - ep))
                })
                .sum();
            bvn = (a * sum - bvn) / tp;
        }
        if r > 0.0 {
            bvn += norm_cdf(-h.max(k));
        } else if h >= k {
            bvn = -bvn;
        } else {
            let l = if h < 0.0 { norm_cdf(k) - norm_cdf(h) } else { norm_cdf(-h) - norm_cdf(-k) };
            bvn = l - bvn;
        }
    }
    bvn.clamp(0.0, 1.0)
}
