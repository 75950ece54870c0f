/// Subtract the least-squares line through `signal`, in place
pub fn detrend_in_place(signal: &mut [f64]) {
    let n = signal.len();
    if n == 0 {
        return;
    }

    let t_mean = (n - 1) as f64 / 2.0;
    let x_mean = signal.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, &x) in signal.iter().enumerate() {
        let dt = i as f64 - t_mean;
        cov += dt * (x - x_mean);
        var += dt * dt;
    }
    // Single sample: only the mean is removed
    let slope = if var > 0.0 { cov / var } else { 0.0 };

    for (i, x) in signal.iter_mut().enumerate() {
        *x -= x_mean + slope * (i as f64 - t_mean);
    }
}

pub fn detrend_linear(signal: &[f64]) -> Vec<f64> {
    let mut out = signal.to_vec();
    detrend_in_place(&mut out);
    out
}
