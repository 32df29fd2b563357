//! Lifecycle status enums stored as lowercase TEXT.

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq,
            serde::Serialize, serde::Deserialize, sqlx::Type,
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $val)]
                #[sqlx(rename = $val)]
                $variant
            ),+
        }

        impl $name {
            /// Value stored in the `status` column.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $val ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Job lifecycle: `queued -> running -> succeeded | failed`.
    JobStatus {
        Queued = "queued",
        Running = "running",
        Succeeded = "succeeded",
        Failed = "failed",
    }
}

define_status_enum! {
    /// Run lifecycle: created `running`, then `succeeded | failed`.
    RunStatus {
        Running = "running",
        Succeeded = "succeeded",
        Failed = "failed",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition. Statuses never move
    /// backwards and terminal statuses are final.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}
