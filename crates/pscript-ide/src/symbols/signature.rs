//! Signature text shown as symbol detail.
//!
//! Renders declarations back into compact PScript notation:
//! - `function Add(a, b: Integer): Integer`
//! - `procedure TList.Clear`
//! - `type TAnimal = class(TObject)`
//! - `const Max = 10`

use pscript_syntax::*;

pub fn routine(routine: &RoutineDecl) -> String {
    let mut out = String::new();
    if routine.is_class_method {
        out.push_str("class ");
    }
    out.push_str(routine.kind.keyword());
    out.push(' ');
    if let Some(class) = &routine.class_name {
        out.push_str(&class.name);
        out.push('.');
    }
    out.push_str(&routine.name.name);
    if !routine.params.is_empty() {
        out.push('(');
        out.push_str(&params(&routine.params));
        out.push(')');
    }
    if let Some(ret) = &routine.return_type {
        out.push_str(": ");
        out.push_str(&type_ref(ret));
    }
    out
}

/// Parameters with consecutive same-typed names grouped: `a, b: Integer; s: String`.
pub fn params(params: &[Param]) -> String {
    let mut groups: Vec<(ParamModifier, Option<String>, Vec<&str>)> = Vec::new();
    for param in params {
        let ty = param.ty.as_ref().map(type_ref);
        match groups.last_mut() {
            Some((modifier, last_ty, names)) if *modifier == param.modifier && *last_ty == ty => {
                names.push(&param.name.name);
            }
            _ => groups.push((param.modifier, ty, vec![&param.name.name])),
        }
    }
    groups
        .into_iter()
        .map(|(modifier, ty, names)| {
            let prefix = match modifier {
                ParamModifier::None => "",
                ParamModifier::Var => "var ",
                ParamModifier::Const => "const ",
                ParamModifier::Out => "out ",
                ParamModifier::Lazy => "lazy ",
            };
            match ty {
                Some(ty) => format!("{prefix}{}: {ty}", names.join(", ")),
                None => format!("{prefix}{}", names.join(", ")),
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn type_ref(ty: &TypeRef) -> String {
    if ty.is_array {
        format!("array of {}", ty.name.name)
    } else {
        ty.name.name.clone()
    }
}

pub fn var(name: &Ident, decl: &VarDecl) -> String {
    match &decl.ty {
        Some(ty) => format!("var {}: {}", name.name, type_ref(ty)),
        None => match &decl.init {
            Some(init) => format!("var {} := {}", name.name, expr(init)),
            None => format!("var {}", name.name),
        },
    }
}

pub fn constant(decl: &ConstDecl) -> String {
    let mut out = format!("const {}", decl.name.name);
    if let Some(ty) = &decl.ty {
        out.push_str(": ");
        out.push_str(&type_ref(ty));
    }
    if let Some(value) = &decl.value {
        out.push_str(" = ");
        out.push_str(&expr(value));
    }
    out
}

pub fn type_decl(decl: &TypeDecl) -> String {
    let def = match &decl.def {
        TypeDef::Class(class) => {
            let heritage: Vec<&str> = class
                .parent
                .iter()
                .chain(&class.interfaces)
                .map(|i| i.name.as_str())
                .collect();
            let mut out = "class".to_string();
            if class.is_abstract {
                out.push_str(" abstract");
            }
            if !heritage.is_empty() {
                out.push_str(&format!("({})", heritage.join(", ")));
            }
            out
        }
        TypeDef::Record(_) => "record".to_string(),
        TypeDef::Interface(def) => match &def.parent {
            Some(parent) => format!("interface({})", parent.name),
            None => "interface".to_string(),
        },
        TypeDef::Enum(def) => {
            let names: Vec<&str> = def.members.iter().map(|m| m.name.name.as_str()).collect();
            format!("({})", names.join(", "))
        }
        TypeDef::Array(def) => match &def.bounds {
            Some((low, high)) => format!(
                "array [{}..{}] of {}",
                expr(low),
                expr(high),
                type_ref(&def.element)
            ),
            None => format!("array of {}", type_ref(&def.element)),
        },
        TypeDef::Set(def) => format!("set of {}", type_ref(&def.element)),
        TypeDef::Helper(def) => format!("helper for {}", type_ref(&def.target)),
        TypeDef::Alias(ty) => type_ref(ty),
    };
    format!("type {} = {}", decl.name.name, def)
}

pub fn field(name: &Ident, field: &FieldDecl) -> String {
    let prefix = if field.is_class_var { "class var " } else { "" };
    match &field.ty {
        Some(ty) => format!("{prefix}{}: {}", name.name, type_ref(ty)),
        None => format!("{prefix}{}", name.name),
    }
}

pub fn property(property: &PropertyDecl) -> String {
    let mut out = String::new();
    if property.is_class_property {
        out.push_str("class ");
    }
    out.push_str("property ");
    out.push_str(&property.name.name);
    if !property.params.is_empty() {
        out.push_str(&format!("[{}]", params(&property.params)));
    }
    if let Some(ty) = &property.ty {
        out.push_str(": ");
        out.push_str(&type_ref(ty));
    }
    if let Some(read) = &property.read {
        out.push_str(" read ");
        out.push_str(&read.name);
    }
    if let Some(write) = &property.write {
        out.push_str(" write ");
        out.push_str(&write.name);
    }
    out
}

/// Literal-level expression rendering; anything more complex is elided.
pub fn expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Ident(ident) => ident.name.clone(),
        ExprKind::Int(value) => value.to_string(),
        ExprKind::Float(value) => value.to_string(),
        ExprKind::Str(value) => format!("'{}'", value.replace('\'', "''")),
        ExprKind::Bool(value) => (if *value { "True" } else { "False" }).to_string(),
        ExprKind::Nil => "nil".to_string(),
        ExprKind::Unary { op, operand } => {
            let op = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Plus => "+",
                UnaryOp::Not => "not ",
            };
            format!("{op}{}", self::expr(operand))
        }
        ExprKind::Binary { op, lhs, rhs } => {
            format!("{} {} {}", self::expr(lhs), binary_op(*op), self::expr(rhs))
        }
        ExprKind::Member { object, member } => format!("{}.{}", self::expr(object), member.name),
        _ => "...".to_string(),
    }
}

fn binary_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::IntDiv => "div",
        BinaryOp::Mod => "mod",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Xor => "xor",
        BinaryOp::Shl => "shl",
        BinaryOp::Shr => "shr",
        BinaryOp::Eq => "=",
        BinaryOp::NotEq => "<>",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::In => "in",
        BinaryOp::Is => "is",
        BinaryOp::As => "as",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_decl(source: &str) -> Decl {
        let result = parse(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        result
            .program
            .decls()
            .next()
            .cloned()
            .expect("declaration")
    }

    #[test]
    fn test_routine_signature_groups_params() {
        let Decl::Routine(r) = first_decl(
            "function Add(a, b: Integer; const s: String): Integer;\nbegin\nend;",
        ) else {
            panic!("expected routine");
        };
        insta::assert_snapshot!(routine(&r), @"function Add(a, b: Integer; const s: String): Integer");
    }

    #[test]
    fn test_method_implementation_signature() {
        let Decl::Routine(r) = first_decl("class procedure TList.Reset;\nbegin\nend;") else {
            panic!("expected routine");
        };
        insta::assert_snapshot!(routine(&r), @"class procedure TList.Reset");
    }

    #[test]
    fn test_type_signatures() {
        let Decl::Type(t) = first_decl("type TDog = class(TAnimal, IBark) end;") else {
            panic!("expected type");
        };
        insta::assert_snapshot!(type_decl(&t), @"type TDog = class(TAnimal, IBark)");

        let Decl::Type(t) = first_decl("type TGrid = array [0..9] of Integer;") else {
            panic!("expected type");
        };
        insta::assert_snapshot!(type_decl(&t), @"type TGrid = array [0..9] of Integer");
    }

    #[test]
    fn test_const_signature() {
        let Decl::Const(c) = first_decl("const Greeting = 'it''s ' + Name;") else {
            panic!("expected const");
        };
        insta::assert_snapshot!(constant(&c), @"const Greeting = 'it''s ' + Name");
    }
}
