use crate::models::FuelLog;

/// Average consumption figures for one vehicle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Efficiency {
    /// Distance per litre
    pub km_per_litre: f64,
    pub cost_per_km: f64,
    pub total_distance: f64,
    pub total_fuel: f64,
}

/// Compute averages from an unordered set of fill-ups.
///
/// Logs are sorted by odometer reading. The fuel and cost of the later log in
/// each consecutive pair are charged against the distance between them; pairs
/// with no forward distance (duplicate or out-of-order readings) are skipped.
/// Fewer than two logs, or nothing left to divide by, yields all zeros.
pub fn calculate(logs: &[FuelLog]) -> Efficiency {
    if logs.len() < 2 {
        return Efficiency::default();
    }

    let mut sorted: Vec<&FuelLog> = logs.iter().collect();
    sorted.sort_by(|a, b| a.odometer.total_cmp(&b.odometer));

    let mut total_distance = 0.0;
    let mut total_fuel = 0.0;
    let mut total_cost = 0.0;
    for pair in sorted.windows(2) {
        let distance = pair[1].odometer - pair[0].odometer;
        if distance <= 0.0 {
            continue;
        }
        total_distance += distance;
        total_fuel += pair[1].amount;
        total_cost += pair[1].cost;
    }

    if total_fuel <= 0.0 || total_distance <= 0.0 {
        return Efficiency::default();
    }

    Efficiency {
        km_per_litre: total_distance / total_fuel,
        cost_per_km: total_cost / total_distance,
        total_distance,
        total_fuel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(odometer: f64, amount: f64, cost: f64) -> FuelLog {
        FuelLog {
            id: String::new(),
            vehicle_id: "v1".to_string(),
            amount,
            cost,
            date: "2024-01-01".to_string(),
            odometer,
            notes: String::new(),
        }
    }

    #[test]
    fn empty_and_single_log_yield_zero() {
        assert_eq!(calculate(&[]), Efficiency::default());
        assert_eq!(calculate(&[log(100.0, 10.0, 50.0)]), Efficiency::default());
    }

    #[test]
    fn two_logs() {
        let result = calculate(&[log(1000.0, 10.0, 1000.0), log(1100.0, 8.0, 800.0)]);
        assert_eq!(result.km_per_litre, 12.5);
        assert_eq!(result.cost_per_km, 8.0);
        assert_eq!(result.total_distance, 100.0);
        assert_eq!(result.total_fuel, 8.0);
    }

    #[test]
    fn order_does_not_matter() {
        let logs = vec![
            log(1300.0, 20.0, 1900.0),
            log(1000.0, 10.0, 1000.0),
            log(1100.0, 8.0, 800.0),
            log(1150.0, 5.0, 450.0),
        ];
        let expected = calculate(&logs);
        let mut reversed = logs.clone();
        reversed.reverse();
        let mut rotated = logs.clone();
        rotated.rotate_left(2);
        assert_eq!(calculate(&reversed), expected);
        assert_eq!(calculate(&rotated), expected);
        assert!(expected.km_per_litre > 0.0);
    }

    #[test]
    fn duplicate_readings_are_skipped() {
        let result = calculate(&[
            log(1000.0, 10.0, 100.0),
            log(1000.0, 30.0, 300.0),
            log(1200.0, 10.0, 100.0),
        ]);
        assert_eq!(result.km_per_litre, 20.0);
        assert_eq!(result.cost_per_km, 0.5);
    }

    #[test]
    fn zero_fuel_guards_division() {
        let result = calculate(&[log(1000.0, 0.0, 0.0), log(1100.0, 0.0, 0.0)]);
        assert_eq!(result, Efficiency::default());
    }

    #[test]
    fn results_are_never_negative() {
        let result = calculate(&[log(500.0, 12.0, 90.0), log(200.0, 9.0, 70.0)]);
        assert!(result.km_per_litre >= 0.0);
        assert!(result.cost_per_km >= 0.0);
    }
}
