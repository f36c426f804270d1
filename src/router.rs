//! Routes and the role guard.
//!
//! Every navigation in the app goes through [`authorize`]. A route is either
//! public or carries the set of roles allowed to open it.

use crate::session::{Role, Session};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Appointment,
    AboutUs,
    /// Look up existing appointments by email.
    AppointmentLookup,
    ForgotPassword,
    ResetPassword,
    PaymentSuccess,
    PaymentFailure,
    Admin { section: Option<String> },
    UsersDashboard,
    AddHelperForm,
    Doctors { department: String },
    Pharmacist,
    Laboratorist,
    Payment,
}

impl Route {
    /// Parses a path such as `/doctors/cardiology`. Returns `None` for
    /// unknown paths.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let route = match segments.as_slice() {
            [] => Route::Landing,
            ["login"] => Route::Login,
            ["signup"] => Route::Signup,
            ["appointment"] => Route::Appointment,
            ["aboutus"] => Route::AboutUs,
            ["appoin"] => Route::AppointmentLookup,
            ["forgot-password"] => Route::ForgotPassword,
            ["reset-password"] => Route::ResetPassword,
            ["payment", "success"] => Route::PaymentSuccess,
            ["payment", "failure"] => Route::PaymentFailure,
            ["payment"] => Route::Payment,
            ["admin"] => Route::Admin { section: None },
            ["admin", section] => Route::Admin {
                section: Some(section.to_string()),
            },
            ["UsersDashboard"] => Route::UsersDashboard,
            ["addhelperform"] => Route::AddHelperForm,
            ["doctors", department] => Route::Doctors {
                department: department.to_string(),
            },
            ["pharmacist"] => Route::Pharmacist,
            ["laboratorist"] => Route::Laboratorist,
            _ => return None,
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Signup => "/signup".to_string(),
            Route::Appointment => "/appointment".to_string(),
            Route::AboutUs => "/aboutus".to_string(),
            Route::AppointmentLookup => "/appoin".to_string(),
            Route::ForgotPassword => "/forgot-password".to_string(),
            Route::ResetPassword => "/reset-password".to_string(),
            Route::PaymentSuccess => "/payment/success".to_string(),
            Route::PaymentFailure => "/payment/failure".to_string(),
            Route::Admin { section: None } => "/admin".to_string(),
            Route::Admin {
                section: Some(section),
            } => format!("/admin/{section}"),
            Route::UsersDashboard => "/UsersDashboard".to_string(),
            Route::AddHelperForm => "/addhelperform".to_string(),
            Route::Doctors { department } => format!("/doctors/{department}"),
            Route::Pharmacist => "/pharmacist".to_string(),
            Route::Laboratorist => "/laboratorist".to_string(),
            Route::Payment => "/payment".to_string(),
        }
    }

    /// Roles allowed to open this route. `None` means public.
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::Admin { .. } => Some(&[Role::Admin]),
            Route::UsersDashboard => Some(&[Role::Card, Role::Nurse]),
            Route::AddHelperForm => Some(&[Role::Card]),
            Route::Doctors { .. } => Some(&[Role::Doctor]),
            Route::Pharmacist => Some(&[Role::Pharmacist]),
            Route::Laboratorist => Some(&[Role::Laboratorist]),
            Route::Payment => Some(&[Role::User, Role::Card]),
            _ => None,
        }
    }

    pub fn is_public(&self) -> bool {
        self.allowed_roles().is_none()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No session. The app sends the user to the login screen.
    Unauthenticated,
    /// Signed in with a role the route does not allow. The app shows a
    /// blocking alert, then sends the user to the login screen.
    Denied { role: String },
}

pub fn authorize(route: &Route, session: Option<&Session>) -> Access {
    if route.is_public() {
        return Access::Granted;
    }
    let allowed = route.allowed_roles().unwrap_or_default();
    let Some(session) = session else {
        return Access::Unauthenticated;
    };
    match session.role() {
        Some(role) if allowed.contains(&role) => Access::Granted,
        _ => Access::Denied {
            role: session.user.role.clone(),
        },
    }
}

/// Where a user lands right after signing in.
pub fn landing_route(session: Option<&Session>) -> Route {
    let Some(session) = session else {
        return Route::Appointment;
    };
    match session.role() {
        Some(Role::Doctor) => Route::Doctors {
            department: session.user.department.clone(),
        },
        Some(Role::Card) => Route::AddHelperForm,
        Some(Role::Admin) => Route::Admin { section: None },
        Some(Role::Nurse) => Route::UsersDashboard,
        Some(Role::Pharmacist) => Route::Pharmacist,
        Some(Role::Laboratorist) => Route::Laboratorist,
        Some(Role::User) | None => Route::Appointment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_session;

    #[test]
    fn paths_round_trip() {
        for path in [
            "/",
            "/login",
            "/appoin",
            "/payment/success",
            "/admin",
            "/admin/doctors",
            "/UsersDashboard",
            "/doctors/general",
            "/payment",
        ] {
            assert_eq!(Route::parse(path).unwrap().path(), path);
        }
        assert_eq!(Route::parse("/login?next=/admin"), Some(Route::Login));
        assert_eq!(Route::parse("/nowhere"), None);
    }

    #[test]
    fn unauthenticated_admin_goes_to_login() {
        let route = Route::parse("/admin").unwrap();
        assert_eq!(authorize(&route, None), Access::Unauthenticated);
    }

    #[test]
    fn public_routes_need_no_session() {
        for path in ["/", "/appointment", "/aboutus", "/payment/failure"] {
            let route = Route::parse(path).unwrap();
            assert_eq!(authorize(&route, None), Access::Granted, "{path}");
        }
    }

    #[test]
    fn role_mismatch_is_denied() {
        let nurse = test_session("nurse", "");
        assert_eq!(authorize(&Route::UsersDashboard, Some(&nurse)), Access::Granted);
        assert_eq!(
            authorize(&Route::AddHelperForm, Some(&nurse)),
            Access::Denied {
                role: "nurse".into()
            }
        );

        let card = test_session("card", "");
        assert_eq!(authorize(&Route::AddHelperForm, Some(&card)), Access::Granted);
        assert_eq!(authorize(&Route::Payment, Some(&card)), Access::Granted);

        let unknown = test_session("janitor", "");
        assert!(matches!(
            authorize(&Route::Pharmacist, Some(&unknown)),
            Access::Denied { .. }
        ));
    }

    #[test]
    fn every_protected_route_admits_only_its_roles() {
        let routes = [
            Route::Admin { section: None },
            Route::UsersDashboard,
            Route::AddHelperForm,
            Route::Doctors {
                department: "general".into(),
            },
            Route::Pharmacist,
            Route::Laboratorist,
            Route::Payment,
        ];
        for route in &routes {
            let allowed = route.allowed_roles().unwrap();
            for role in Role::ALL {
                let session = test_session(role.as_str(), "general");
                let granted = authorize(route, Some(&session)) == Access::Granted;
                assert_eq!(granted, allowed.contains(&role), "{role} on {route}");
            }
        }
    }

    #[test]
    fn landing_routes_by_role() {
        let doctor = test_session("doctor", "general");
        assert_eq!(landing_route(Some(&doctor)).path(), "/doctors/general");
        assert_eq!(
            landing_route(Some(&test_session("card", ""))).path(),
            "/addhelperform"
        );
        assert_eq!(
            landing_route(Some(&test_session("admin", ""))).path(),
            "/admin"
        );
        assert_eq!(
            landing_route(Some(&test_session("nurse", ""))).path(),
            "/UsersDashboard"
        );
        assert_eq!(
            landing_route(Some(&test_session("receptionist", ""))).path(),
            "/appointment"
        );
        assert_eq!(landing_route(None).path(), "/appointment");
    }
}
