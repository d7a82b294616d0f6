pub mod attendance_repo;
pub use attendance_repo::AttendanceRepository;
pub mod cash_register_repo;
pub use cash_register_repo::CashRegisterRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod change_feed;
pub mod restaurant_repo;
pub use restaurant_repo::RestaurantRepository;
