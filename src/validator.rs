//! Input gate run before any solving.

use crate::error::Diagnostic;
use crate::traits::{FleetField, Order, OrderField, Vehicle};

/// Checks that orders, fleet, and distance matrix are well-formed.
///
/// A required field counts as present when at least one record carries it;
/// individual gaps are filled by the normalizer. When `expected_size` is
/// given the matrix dimension must match it exactly (orders + depot).
pub fn validate<O, V>(
    orders: &[O],
    required_order_fields: &[OrderField],
    fleet: &[V],
    required_fleet_fields: &[FleetField],
    matrix: &[Vec<f64>],
    expected_size: Option<usize>,
) -> Result<(), Diagnostic>
where
    O: Order,
    V: Vehicle,
{
    if orders.is_empty() {
        return Err(Diagnostic::EmptyInput {
            entity: "orders".to_string(),
        });
    }
    let missing: Vec<String> = required_order_fields
        .iter()
        .filter(|field| !orders.iter().any(|order| field.present_on(order)))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Diagnostic::MissingField {
            entity: "orders".to_string(),
            fields: missing,
        });
    }

    if fleet.is_empty() {
        return Err(Diagnostic::EmptyInput {
            entity: "fleet".to_string(),
        });
    }
    let missing: Vec<String> = required_fleet_fields
        .iter()
        .filter(|field| !fleet.iter().any(|vehicle| field.present_on(vehicle)))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Diagnostic::MissingField {
            entity: "fleet".to_string(),
            fields: missing,
        });
    }

    validate_matrix(matrix, expected_size)
}

/// Checks that `matrix` is square and, if given, of `expected_size`.
pub fn validate_matrix(matrix: &[Vec<f64>], expected_size: Option<usize>) -> Result<(), Diagnostic> {
    let rows = matrix.len();
    if let Some(row) = matrix.iter().position(|row| row.len() != rows) {
        return Err(Diagnostic::MalformedMatrix {
            reason: format!(
                "matrix is not square: {} rows but row {} has {} columns",
                rows,
                row,
                matrix[row].len()
            ),
        });
    }
    if let Some(expected) = expected_size {
        if rows != expected {
            return Err(Diagnostic::MalformedMatrix {
                reason: format!("matrix has size {}, expected {}", rows, expected),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{OrderRecord, VehicleRecord};

    fn square(n: usize) -> Vec<Vec<f64>> {
        vec![vec![1.0; n]; n]
    }

    fn orders() -> Vec<OrderRecord> {
        vec![OrderRecord::new("o1", 10.0), OrderRecord::new("o2", 5.0)]
    }

    fn fleet() -> Vec<VehicleRecord> {
        vec![VehicleRecord::new("AAA-0001", 100.0)]
    }

    #[test]
    fn test_valid_input_passes() {
        let result = validate(
            &orders(),
            &[OrderField::Demand],
            &fleet(),
            &[FleetField::Capacity],
            &square(3),
            Some(3),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_empty_orders() {
        let result = validate::<OrderRecord, _>(&[], &[], &fleet(), &[], &square(1), None);
        assert_eq!(
            result,
            Err(Diagnostic::EmptyInput {
                entity: "orders".to_string()
            })
        );
    }

    #[test]
    fn test_empty_fleet() {
        let result = validate::<_, VehicleRecord>(&orders(), &[], &[], &[], &square(3), None);
        assert_eq!(result.unwrap_err().code(), "EmptyInput");
    }

    #[test]
    fn test_missing_order_fields_are_all_named() {
        let result = validate(
            &orders(),
            &[OrderField::Demand, OrderField::Location, OrderField::Region],
            &fleet(),
            &[],
            &square(3),
            None,
        );
        assert_eq!(
            result,
            Err(Diagnostic::MissingField {
                entity: "orders".to_string(),
                fields: vec!["location".to_string(), "region".to_string()],
            })
        );
    }

    #[test]
    fn test_missing_capacity_column() {
        let fleet = vec![VehicleRecord::unlabeled(0, None)];
        let result = validate(&orders(), &[], &fleet, &[FleetField::Capacity], &square(3), None);
        assert_eq!(
            result,
            Err(Diagnostic::MissingField {
                entity: "fleet".to_string(),
                fields: vec!["capacity".to_string()],
            })
        );
    }

    #[test]
    fn test_partial_demand_column_is_present() {
        let mut orders = orders();
        orders[0].demand = None;
        let result = validate(&orders, &[OrderField::Demand], &fleet(), &[], &square(3), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_non_square_matrix() {
        let matrix = vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 3.0]];
        let result = validate_matrix(&matrix, None);
        assert_eq!(result.unwrap_err().code(), "MalformedMatrix");
    }

    #[test]
    fn test_matrix_size_mismatch() {
        let result = validate(&orders(), &[], &fleet(), &[], &square(4), Some(3));
        assert_eq!(
            result,
            Err(Diagnostic::MalformedMatrix {
                reason: "matrix has size 4, expected 3".to_string()
            })
        );
    }

    #[test]
    fn test_size_not_enforced_when_unknown() {
        assert!(validate_matrix(&square(7), None).is_ok());
    }
}
