pub mod services;

// Re-export key types for convenience
pub use services::{
    AdminStats, Analytics, DailyRevenue, LotAdminService, LotAvailability, LotRevenue,
    ReservationService, UserService,
};
