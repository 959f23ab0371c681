use ace_expand::IsingParams;
use nalgebra::DMatrix;

fn internal() -> DMatrix<f64> {
    DMatrix::from_row_slice(
        3,
        3,
        &[
            0.7, -0.2, 0.05, //
            -0.2, -0.4, 0.3, //
            0.05, 0.3, 0.1,
        ],
    )
}

#[test]
fn two_variable_conversion_by_hand() {
    let j = DMatrix::from_row_slice(2, 2, &[0.6, -0.3, -0.3, -0.2]);
    let params = IsingParams::from_interactions(&j);
    // h = (-0.6, 0.2), K = 0.6
    assert!((params.fields[0] - (-0.3 + 0.15)).abs() < 1e-15);
    assert!((params.fields[1] - (0.1 + 0.15)).abs() < 1e-15);
    assert!((params.couplings[0] - 0.15).abs() < 1e-15);
    assert_eq!(params.to_vec().len(), 3);
}

#[test]
fn spin_and_bit_models_assign_the_same_relative_weights() {
    let j = internal();
    let params = IsingParams::from_interactions(&j);
    let n = 3;
    let mut offsets = Vec::new();
    for mask in 0..1usize << n {
        let bits: Vec<f64> = (0..n).map(|i| ((mask >> i) & 1) as f64).collect();
        let spins: Vec<f64> = bits.iter().map(|b| 2.0 * b - 1.0).collect();
        let mut bit_log_weight = 0.0;
        for a in 0..n {
            for b in 0..n {
                bit_log_weight -= bits[a] * j[(a, b)] * bits[b];
            }
        }
        let mut spin_log_weight: f64 = (0..n).map(|i| params.fields[i] * spins[i]).sum();
        for a in 0..n {
            for b in (a + 1)..n {
                spin_log_weight += params.coupling(a, b) * spins[a] * spins[b];
            }
        }
        offsets.push(bit_log_weight - spin_log_weight);
    }
    for offset in &offsets {
        assert!((offset - offsets[0]).abs() < 1e-12);
    }
}

#[test]
fn couplings_are_row_major_upper_triangle() {
    let params = IsingParams::from_interactions(&internal());
    assert_eq!(params.couplings.len(), 3);
    assert!((params.coupling(0, 1) - 0.1).abs() < 1e-15);
    assert!((params.coupling(2, 0) - (-0.025)).abs() < 1e-15);
    assert!((params.coupling(1, 2) - (-0.15)).abs() < 1e-15);
    let flat = params.to_vec();
    assert_eq!(&flat[..3], params.fields.as_slice());
    assert_eq!(&flat[3..], params.couplings.as_slice());
}

#[test]
fn zero_one_conversion_inverts_spin_conversion() {
    let j = internal();
    let params = IsingParams::from_interactions(&j);
    let (fields, couplings) = params.to_zero_one();
    for i in 0..3 {
        assert!((fields[i] + j[(i, i)]).abs() < 1e-12);
    }
    let expected = [-2.0 * j[(0, 1)], -2.0 * j[(0, 2)], -2.0 * j[(1, 2)]];
    for (k, e) in couplings.iter().zip(expected) {
        assert!((k - e).abs() < 1e-12);
    }
}
