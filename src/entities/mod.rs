pub mod prelude;

pub mod alternate_titles;
pub mod categories;
pub mod contacts;
pub mod daily_planning;
pub mod episodes;
pub mod external_links;
pub mod formats;
pub mod license_types;
pub mod origins;
pub mod seasonal_planning;
pub mod seasons;
pub mod staff_roles;
pub mod targets;
pub mod title_categories;
pub mod title_distributors;
pub mod title_staff;
pub mod title_studios;
pub mod titles;
