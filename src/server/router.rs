//! The record types served through the generic CRUD routes

use super::entity_registry::EntityRegistry;
use crate::entities::{
    Branch, Company, Department, Designation, Employee, Expense, Order, Purchase, Revenue,
    SalaryHead, SalarySetting, TaxSlab,
};

/// Registry with every CRUD resource of the service
///
/// Salary slips are not listed: they are generated and paid through
/// `/api/payroll`, never written directly.
pub fn resource_registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    registry.register_crud::<Company>();
    registry.register_crud::<Branch>();
    registry.register_crud::<Department>();
    registry.register_crud::<Designation>();
    registry.register_crud::<Employee>();
    registry.register_crud::<Order>();
    registry.register_crud::<Revenue>();
    registry.register_crud::<Expense>();
    registry.register_crud::<Purchase>();
    registry.register_crud::<SalaryHead>();
    registry.register_crud::<SalarySetting>();
    registry.register_crud::<TaxSlab>();
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_resources_registered() {
        let registry = resource_registry();
        let types = registry.entity_types();
        assert_eq!(types.len(), 12);
        for expected in ["company", "employee", "order", "purchase", "tax slab"] {
            assert!(types.contains(&expected), "missing {}", expected);
        }
        assert!(!types.contains(&"salary slip"));
    }
}
