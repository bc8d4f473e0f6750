use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: CpsExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CpsExpr {
    Call {
        func: String,
        args: Vec<String>,
    },

    Let {
        var: String,
        rhs: Box<CpsExpr>,
        body: Box<CpsExpr>,
    },

    If {
        cond: String,
        then_branch: Box<CpsExpr>,
        else_branch: Box<CpsExpr>,
    },

    Return {
        value: String,
    },
}

impl CpsExpr {
    pub fn call(func: impl Into<String>, args: Vec<String>) -> Self {
        CpsExpr::Call {
            func: func.into(),
            args,
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        match self {
            CpsExpr::Call { func, args } => {
                writeln!(f, "{pad}call {func}({})", args.join(", "))
            }

            CpsExpr::Let { var, rhs, body } => {
                writeln!(f, "{pad}let {var} =")?;
                rhs.write_indented(f, indent + 2)?;
                writeln!(f, "{pad}in")?;
                body.write_indented(f, indent + 2)
            }

            CpsExpr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                writeln!(f, "{pad}if {cond} then")?;
                then_branch.write_indented(f, indent + 2)?;
                writeln!(f, "{pad}else")?;
                else_branch.write_indented(f, indent + 2)
            }

            CpsExpr::Return { value } => writeln!(f, "{pad}return {value}"),
        }
    }
}

impl fmt::Display for CpsExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function {}({}):", self.name, self.params.join(", "))?;
        self.body.write_indented(f, 2)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            function.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printer_layout() {
        let expr = CpsExpr::Let {
            var: String::from("_t0"),
            rhs: Box::new(CpsExpr::call("*", vec!["3".into(), "4".into()])),
            body: Box::new(CpsExpr::If {
                cond: String::from("_t0"),
                then_branch: Box::new(CpsExpr::Return {
                    value: String::from("_t0"),
                }),
                else_branch: Box::new(CpsExpr::call("_halt", vec!["0".into()])),
            }),
        };

        let rendered = expr.to_string();
        assert_eq!(
            rendered,
            "let _t0 =\n  call *(3, 4)\nin\n  if _t0 then\n    return _t0\n  else\n    call _halt(0)\n"
        );
    }
}
