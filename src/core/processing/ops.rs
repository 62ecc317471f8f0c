use ndarray::{Array2, Zip};

use crate::error::{Error, Result};

fn check_shapes(a: &Array2<f64>, b: &Array2<f64>) -> Result<()> {
    if a.dim() != b.dim() {
        return Err(Error::DimensionMismatch {
            expected: a.dim(),
            found: b.dim(),
        });
    }
    Ok(())
}

/// NIRv from raw red/NIR digital numbers: `(nir - red) * nir / (nir + red)`
/// after multiplying both by `scale`. A zero denominator or undefined input
/// yields `NaN`.
pub fn nirv(red_dn: &Array2<f64>, nir_dn: &Array2<f64>, scale: f64) -> Result<Array2<f64>> {
    check_shapes(red_dn, nir_dn)?;
    let mut result = Array2::from_elem(red_dn.dim(), f64::NAN);
    Zip::from(red_dn)
        .and(nir_dn)
        .and(&mut result)
        .par_for_each(|&red_dn, &nir_dn, res| {
            let red = red_dn * scale;
            let nir = nir_dn * scale;
            let sum = nir + red;
            if sum != 0.0 && sum.is_finite() {
                *res = (nir - red) * nir / sum;
            }
        });
    Ok(result)
}

/// Element-wise ratio a / b; zero or undefined denominators yield `NaN`
pub fn ratio_arrays(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    check_shapes(a, b)?;
    let mut result = Array2::from_elem(a.dim(), f64::NAN);
    Zip::from(a)
        .and(b)
        .and(&mut result)
        .par_for_each(|&a_val, &b_val, res| {
            if b_val != 0.0 && b_val.is_finite() && a_val.is_finite() {
                *res = a_val / b_val;
            }
        });
    Ok(result)
}

/// Element-wise product a * b; `NaN` propagates
pub fn product_arrays(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    check_shapes(a, b)?;
    let mut result = Array2::zeros(a.dim());
    Zip::from(a)
        .and(b)
        .and(&mut result)
        .par_for_each(|&a_val, &b_val, res| *res = a_val * b_val);
    Ok(result)
}

/// Replace exact matches of any fill value with `NaN`
pub fn mask_values(data: &mut Array2<f64>, fills: &[f64]) {
    if fills.is_empty() {
        return;
    }
    data.par_mapv_inplace(|v| if fills.contains(&v) { f64::NAN } else { v });
}
