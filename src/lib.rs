pub mod rtferror;

pub mod math {
    pub mod law {
        pub mod law;
        pub mod expressionlaw;
        pub mod lawregistry;
    }

    pub mod piecewise {
        pub mod segmentlawset;
        pub mod continuitycompositor;
        pub mod forwardevaluator;
        pub mod derivativeestimator;
        pub mod inverter;
    }
}

pub mod model {
    pub mod modelmetadata;
    pub mod radiometrictransferfunction;
    pub mod modeldefinition;
    pub mod reservoir;
}

pub mod time {
    pub mod calendardate;
    pub mod stratigraphy;
}
